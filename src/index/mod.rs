//! # Band Index
//!
//! Per-column search brackets anchored on a fully populated reference scan.
//!
//! For each column `i` of the reference row (value `r`), `lower[i]` is the
//! first column such that every scan holds values `< r` in all columns left
//! of it, and `upper[i]` the last column such that every scan holds values
//! `> r` in all columns right of it. A range query `[lo, hi]` mapped onto the
//! reference row can therefore restrict every scan to a single column slice
//! without missing a value.
//!
//! The brackets are only as tight as the column alignment across scans
//! allows; misaligned centroided data degrades them towards the full row.


use crate::dataset::DatasetError;

/// First index whose value is strictly greater than `threshold`.
///
/// `values` must be ascending; trailing NaN padding is treated as greater
/// than any threshold. Returns `values.len()` when nothing is greater.
pub fn index_greater_than(threshold: f64, values: &[f64]) -> usize {
    values.partition_point(|&v| v <= threshold)
}

/// Band index over the m/z grid of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionIndex {
    reference_row: usize,
    lower: Vec<usize>,
    upper: Vec<usize>,
}

impl ExtractionIndex {
    /// Build the brackets from a padded row-major m/z grid.
    ///
    /// A column is only usable as a stop when no scan is padded there; padded
    /// columns can prove nothing about every scan.
    pub fn build(mz: &[f64], peak_counts: &[usize], width: usize, reference_row: usize) -> Self {
        let scans = peak_counts.len();
        let populated = peak_counts.iter().copied().min().unwrap_or(0);

        let mut col_min = vec![f64::INFINITY; populated];
        let mut col_max = vec![f64::NEG_INFINITY; populated];
        for row in 0..scans {
            let values = &mz[row * width..row * width + populated];
            for (col, &v) in values.iter().enumerate() {
                col_min[col] = col_min[col].min(v);
                col_max[col] = col_max[col].max(v);
            }
        }

        let reference = &mz[reference_row * width..(reference_row + 1) * width];
        let mut lower = Vec::with_capacity(width);
        let mut upper = Vec::with_capacity(width);
        for (i, &r) in reference.iter().enumerate() {
            let lo = (0..i.min(populated))
                .rev()
                .find(|&j| col_max[j] < r)
                .map_or(0, |j| j + 1);
            let hi = (i + 1..populated)
                .find(|&j| col_min[j] > r)
                .map_or(width - 1, |j| j - 1);
            lower.push(lo);
            upper.push(hi);
        }

        Self {
            reference_row,
            lower,
            upper,
        }
    }

    /// Assemble an index from stored parts; checked later against the grid.
    pub(crate) fn from_parts(reference_row: usize, lower: Vec<usize>, upper: Vec<usize>) -> Self {
        Self {
            reference_row,
            lower,
            upper,
        }
    }

    /// Scan the brackets are anchored on
    pub fn reference_row(&self) -> usize {
        self.reference_row
    }

    /// Lowest admissible column per reference column
    pub fn lower(&self) -> &[usize] {
        &self.lower
    }

    /// Highest admissible column per reference column
    pub fn upper(&self) -> &[usize] {
        &self.upper
    }

    /// Number of columns covered
    pub fn width(&self) -> usize {
        self.lower.len()
    }

    /// Inclusive column slice that holds every scan's values in
    /// `[mz_lo, mz_hi]`, given the reference row's m/z values.
    ///
    /// Returns `None` for an empty grid.
    pub fn column_slice(&self, reference_mz: &[f64], mz_lo: f64, mz_hi: f64) -> Option<(usize, usize)> {
        let width = self.width();
        if width == 0 {
            return None;
        }
        let lo = index_greater_than(mz_lo, reference_mz).saturating_sub(1);
        let hi = index_greater_than(mz_hi, reference_mz).min(width - 1);
        Some((self.lower[lo], self.upper[hi]))
    }

    /// Whether every bracket of `self` contains the matching bracket of
    /// `other`, i.e. `self` is at least as safe as `other`.
    pub fn covers(&self, other: &ExtractionIndex) -> bool {
        self.width() == other.width()
            && self
                .lower
                .iter()
                .zip(&other.lower)
                .all(|(mine, theirs)| mine <= theirs)
            && self
                .upper
                .iter()
                .zip(&other.upper)
                .all(|(mine, theirs)| mine >= theirs)
    }

    /// Check lengths and bracket ordering against a grid width
    pub(crate) fn check_shape(&self, width: usize) -> Result<(), DatasetError> {
        if self.lower.len() != width || self.upper.len() != width {
            return Err(DatasetError::BandIndexMismatch(format!(
                "index covers {}/{} columns, grid has {}",
                self.lower.len(),
                self.upper.len(),
                width
            )));
        }
        for (i, (&lo, &hi)) in self.lower.iter().zip(&self.upper).enumerate() {
            if lo > i || hi < i || hi >= width {
                return Err(DatasetError::BandIndexMismatch(format!(
                    "column {i} has bracket [{lo}, {hi}]"
                )));
            }
        }
        Ok(())
    }
}
