use super::{Chromatogram, ChromatogramExtraction, ExtractionMode, Extractor};

impl<'a> Extractor<'a> {
    /// Intensity summed over `[mz_lo, mz_hi]` for every scan.
    ///
    /// In exact mode a scan without any value in the window yields `None`.
    /// Fast mode sums the whole band-index slice and always yields a value.
    /// An inverted or NaN window yields `None` for every scan.
    pub fn chromatogram(&self, mz_lo: f64, mz_hi: f64, mode: ExtractionMode) -> ChromatogramExtraction {
        let dataset = self.dataset;
        let retention_time = dataset.retention_time().to_vec();
        let scans = dataset.scan_count();

        let slice = if mz_lo <= mz_hi {
            dataset.index().column_slice(
                dataset.padded_mz_row(dataset.reference_row()),
                mz_lo,
                mz_hi,
            )
        } else {
            None
        };

        let intensity = match slice {
            None => vec![None; scans],
            Some((c0, c1)) => (0..scans)
                .map(|row| match mode {
                    ExtractionMode::Exact => self.exact_sum(row, c0, c1, mz_lo, mz_hi),
                    ExtractionMode::Fast => {
                        Some(dataset.padded_intensity_row(row)[c0..=c1].iter().sum())
                    }
                })
                .collect(),
        };

        let current = Chromatogram {
            retention_time,
            intensity,
        };
        let before_subtraction = self.chromatogram_before_subtraction(&current, mz_lo, mz_hi);
        ChromatogramExtraction {
            current,
            before_subtraction,
        }
    }

    /// Total ion chromatogram, the chromatogram over `[0, +inf)`
    pub fn total_ion_chromatogram(&self, mode: ExtractionMode) -> ChromatogramExtraction {
        self.chromatogram(0.0, f64::INFINITY, mode)
    }

    /// Sum of populated intensities of `row` in columns `c0..=c1` whose m/z
    /// lies in the window
    pub(crate) fn exact_sum(&self, row: usize, c0: usize, c1: usize, mz_lo: f64, mz_hi: f64) -> Option<f64> {
        let mz = self.dataset.row_mz(row);
        let intensity = self.dataset.row_intensity(row);
        let end = (c1 + 1).min(mz.len());
        if c0 >= end {
            return None;
        }
        let mut hit = false;
        let mut total = 0.0;
        for (m, v) in mz[c0..end].iter().zip(&intensity[c0..end]) {
            if *m >= mz_lo && *m <= mz_hi {
                hit = true;
                total += v;
            }
        }
        hit.then_some(total)
    }

    /// Current value plus everything subtraction removed inside the window.
    ///
    /// Scans without a record, or whose record has no entry in the window,
    /// yield `None`.
    fn chromatogram_before_subtraction(
        &self,
        current: &Chromatogram,
        mz_lo: f64,
        mz_hi: f64,
    ) -> Option<Chromatogram> {
        let overlay = self.dataset.overlay();
        if overlay.is_empty() {
            return None;
        }
        let intensity = current
            .intensity
            .iter()
            .enumerate()
            .map(|(row, value)| {
                let removed = overlay.record(row)?.removed_in_range(mz_lo, mz_hi)?;
                Some(value.unwrap_or(0.0) + removed)
            })
            .collect();
        Some(Chromatogram {
            retention_time: current.retention_time.clone(),
            intensity,
        })
    }
}
