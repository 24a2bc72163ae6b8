//! Multi-axis delta coding over 2-D integer grids.
//!
//! Each step replaces the grid by its first-order difference along one axis
//! and keeps the removed leading slice as a seed. Decoding integrates in
//! reverse axis order. All arithmetic wraps, so any `i64` grid round-trips
//! exactly.

use super::CodecError;

/// Scan axis (rows)
pub const ROW_AXIS: u8 = 0;
/// Column axis (peaks within a scan)
pub const COLUMN_AXIS: u8 = 1;

/// Row-major 2-D grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<i64>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, data: Vec<i64>) -> Self {
        debug_assert_eq!(rows.checked_mul(cols), Some(data.len()));
        Self { rows, cols, data }
    }

    fn extent(&self, axis: u8) -> usize {
        if axis == ROW_AXIS {
            self.rows
        } else {
            self.cols
        }
    }
}

/// Delta-coded grid: original shape, applied steps and what is left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaEncoded {
    pub rows: usize,
    pub cols: usize,
    /// Axes actually differenced, in application order
    pub axes: Vec<u8>,
    /// Leading slice removed by each step
    pub seeds: Vec<Vec<i64>>,
    pub residual: Grid,
}

/// Difference `grid` along each axis in turn; steps over an empty extent
/// are skipped.
pub fn encode(grid: Grid, axes: &[u8]) -> DeltaEncoded {
    let (rows, cols) = (grid.rows, grid.cols);
    let mut current = grid;
    let mut applied = Vec::with_capacity(axes.len());
    let mut seeds = Vec::with_capacity(axes.len());
    for &axis in axes {
        if current.extent(axis) == 0 {
            continue;
        }
        let (seed, next) = diff(&current, axis);
        applied.push(axis);
        seeds.push(seed);
        current = next;
    }
    DeltaEncoded {
        rows,
        cols,
        axes: applied,
        seeds,
        residual: current,
    }
}

/// Reverse [`encode`], checking every seed against the grid it restores
pub fn decode(encoded: DeltaEncoded) -> Result<Grid, CodecError> {
    let DeltaEncoded {
        rows,
        cols,
        axes,
        seeds,
        residual,
    } = encoded;
    if axes.len() != seeds.len() {
        return Err(CodecError::Malformed(format!(
            "{} delta axes but {} seeds",
            axes.len(),
            seeds.len()
        )));
    }
    if residual.rows.checked_mul(residual.cols) != Some(residual.data.len()) {
        return Err(CodecError::Malformed("residual grid size does not match its shape".to_string()));
    }
    let (expected_rows, expected_cols) = residual_shape(rows, cols, &axes)?;
    if (residual.rows, residual.cols) != (expected_rows, expected_cols) {
        return Err(CodecError::Malformed(format!(
            "residual grid is {}x{}, but {}x{} differenced along {:?} leaves {}x{}",
            residual.rows, residual.cols, rows, cols, axes, expected_rows, expected_cols
        )));
    }

    let mut current = residual;
    for (&axis, seed) in axes.iter().zip(seeds).rev() {
        current = integrate(&current, axis, seed)?;
    }
    if current.rows != rows || current.cols != cols {
        return Err(CodecError::Malformed(format!(
            "delta decoding produced {}x{}, expected {}x{}",
            current.rows, current.cols, rows, cols
        )));
    }
    Ok(current)
}

/// Shape left after differencing a `rows x cols` grid along `axes`.
///
/// Every applied step must have had a non-empty extent to difference.
fn residual_shape(rows: usize, cols: usize, axes: &[u8]) -> Result<(usize, usize), CodecError> {
    let (mut rows, mut cols) = (rows, cols);
    for &axis in axes {
        let extent = if axis == ROW_AXIS { &mut rows } else { &mut cols };
        *extent = extent.checked_sub(1).ok_or_else(|| {
            CodecError::Malformed(format!("delta step along axis {axis} over an empty extent"))
        })?;
    }
    Ok((rows, cols))
}

fn diff(grid: &Grid, axis: u8) -> (Vec<i64>, Grid) {
    let Grid { rows, cols, data } = grid;
    let (rows, cols) = (*rows, *cols);
    if axis == ROW_AXIS {
        let seed = data[..cols].to_vec();
        let body = data[cols..]
            .iter()
            .zip(&data[..data.len() - cols])
            .map(|(next, prev)| next.wrapping_sub(*prev))
            .collect();
        (seed, Grid::new(rows - 1, cols, body))
    } else {
        let mut seed = Vec::with_capacity(rows);
        let mut body = Vec::with_capacity(rows * (cols - 1));
        for row in data.chunks_exact(cols) {
            seed.push(row[0]);
            body.extend(row.windows(2).map(|w| w[1].wrapping_sub(w[0])));
        }
        (seed, Grid::new(rows, cols - 1, body))
    }
}

fn integrate(grid: &Grid, axis: u8, seed: Vec<i64>) -> Result<Grid, CodecError> {
    let Grid { rows, cols, data } = grid;
    let (rows, cols) = (*rows, *cols);
    let expected_seed = if axis == ROW_AXIS { cols } else { rows };
    if seed.len() != expected_seed {
        return Err(CodecError::Malformed(format!(
            "delta seed holds {} values, expected {}",
            seed.len(),
            expected_seed
        )));
    }

    let overflow = || CodecError::Malformed(format!("delta step along axis {axis} overflows a {rows}x{cols} grid"));
    if axis == ROW_AXIS {
        let out_rows = rows.checked_add(1).ok_or_else(overflow)?;
        let cells = out_rows.checked_mul(cols).ok_or_else(overflow)?;
        let mut out = Vec::with_capacity(cells);
        out.extend_from_slice(&seed);
        for (i, delta) in data.iter().enumerate() {
            let prev = out[i];
            out.push(prev.wrapping_add(*delta));
        }
        Ok(Grid::new(out_rows, cols, out))
    } else {
        let out_cols = cols.checked_add(1).ok_or_else(overflow)?;
        let cells = rows.checked_mul(out_cols).ok_or_else(overflow)?;
        let mut out = Vec::with_capacity(cells);
        for (row, first) in seed.into_iter().enumerate() {
            let mut acc = first;
            out.push(acc);
            for delta in &data[row * cols..(row + 1) * cols] {
                acc = acc.wrapping_add(*delta);
                out.push(acc);
            }
        }
        Ok(Grid::new(rows, out_cols, out))
    }
}
