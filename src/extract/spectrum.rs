use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Range;

use super::{ExtractionMode, Extractor, Spectrum, SpectrumExtraction};
use crate::numeric::{interp, mean};

impl<'a> Extractor<'a> {
    /// Spectrum averaged over scans with RT in `(rt_lo, rt_hi]`.
    ///
    /// Exact mode pools every (m/z, intensity) pair of the selected scans,
    /// sorts them by m/z and averages consecutive groups of one value per
    /// scan, so scans with shifted grids still line up by rank. Groups that
    /// would include padding are dropped. Fast mode averages raw columns and
    /// skips columns padded in any selected scan.
    pub fn spectrum(&self, rt_lo: f64, rt_hi: f64, mode: ExtractionMode) -> SpectrumExtraction {
        let rows = self.rows_in_rt_window(rt_lo, rt_hi);
        let current = match mode {
            ExtractionMode::Exact => self.rank_averaged_spectrum(rows.clone()),
            ExtractionMode::Fast => self.column_averaged_spectrum(rows.clone()),
        };
        let before_subtraction = self.spectrum_before_subtraction(rows, &current);
        SpectrumExtraction {
            current,
            before_subtraction,
        }
    }

    fn rank_averaged_spectrum(&self, rows: Range<usize>) -> Spectrum {
        let dataset = self.dataset;
        let n_rt = rows.len();
        if n_rt == 0 {
            return Spectrum::default();
        }

        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n_rt * dataset.width());
        for row in rows {
            let mz = dataset.padded_mz_row(row);
            let intensity = dataset.padded_intensity_row(row);
            pairs.extend(mz.iter().copied().zip(intensity.iter().copied()));
        }
        // stable: equal m/z keep scan order
        pairs.sort_by(|a, b| padding_last(a.0, b.0));

        let usable = pairs.len() - pairs.len() % n_rt;
        let mut spectrum = Spectrum::default();
        for group in pairs[..usable].chunks_exact(n_rt) {
            if group.iter().any(|(m, _)| m.is_nan()) {
                break;
            }
            let inv = 1.0 / n_rt as f64;
            spectrum.mz.push(group.iter().map(|(m, _)| m).sum::<f64>() * inv);
            spectrum
                .intensity
                .push(group.iter().map(|(_, v)| v).sum::<f64>() * inv);
        }
        spectrum
    }

    fn column_averaged_spectrum(&self, rows: Range<usize>) -> Spectrum {
        let dataset = self.dataset;
        if rows.is_empty() {
            return Spectrum::default();
        }
        let populated = rows
            .clone()
            .map(|row| dataset.peak_count(row))
            .min()
            .unwrap_or(0);

        let mut spectrum = Spectrum::default();
        let mut mz_column = Vec::with_capacity(rows.len());
        let mut intensity_column = Vec::with_capacity(rows.len());
        for col in 0..populated {
            mz_column.clear();
            intensity_column.clear();
            for row in rows.clone() {
                mz_column.push(dataset.padded_mz_row(row)[col]);
                intensity_column.push(dataset.padded_intensity_row(row)[col]);
            }
            if let (Some(m), Some(v)) = (mean(&mz_column), mean(&intensity_column)) {
                spectrum.mz.push(m);
                spectrum.intensity.push(v);
            }
        }
        spectrum
    }

    /// Rebuild the pre-subtraction signal on touched columns.
    ///
    /// Each touched column gets the mean recorded m/z and the removed
    /// intensity averaged over all selected scans, added on top of the
    /// current spectrum interpolated at that m/z. Non-adjacent columns start
    /// a new segment so disjoint blocks are never joined.
    fn spectrum_before_subtraction(&self, rows: Range<usize>, current: &Spectrum) -> Option<Vec<Spectrum>> {
        let overlay = self.dataset.overlay();
        let n_rt = rows.len();
        if overlay.is_empty() || n_rt == 0 {
            return None;
        }

        // column -> (sum of m/z, records, sum of removed)
        let mut columns: BTreeMap<usize, (f64, usize, f64)> = BTreeMap::new();
        for row in rows {
            let Some(record) = overlay.record(row) else {
                continue;
            };
            for entry in record.entries() {
                let slot = columns.entry(entry.column).or_insert((0.0, 0, 0.0));
                slot.0 += entry.mz;
                slot.1 += 1;
                slot.2 += entry.removed;
            }
        }
        if columns.is_empty() {
            return None;
        }

        let mut segments: Vec<Spectrum> = Vec::new();
        let mut previous: Option<usize> = None;
        for (&column, &(mz_sum, count, removed_sum)) in &columns {
            let mz = mz_sum / count as f64;
            let value =
                removed_sum / n_rt as f64 + interp(mz, &current.mz, &current.intensity, 0.0, 0.0);
            let contiguous = previous.is_some_and(|p| p + 1 == column);
            match segments.last_mut() {
                Some(segment) if contiguous => {
                    segment.mz.push(mz);
                    segment.intensity.push(value);
                }
                _ => segments.push(Spectrum {
                    mz: vec![mz],
                    intensity: vec![value],
                }),
            }
            previous = Some(column);
        }
        Some(segments)
    }
}

/// Ascending order with NaN padding after every real value
fn padding_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}
