use super::{AucOptions, Extractor, PeakMetrics};
use crate::numeric::trapezoid;

impl<'a> Extractor<'a> {
    /// Peak metrics of the chromatogram over `[mz_lo, mz_hi]` restricted to
    /// scans with RT in `(rt_lo, rt_hi]`.
    ///
    /// Returns `None` when fewer than two scans fall in the RT window. Scans
    /// without a value in the m/z window count as zero intensity.
    pub fn chromatogram_auc(
        &self,
        mz_lo: f64,
        mz_hi: f64,
        rt_lo: f64,
        rt_hi: f64,
        options: AucOptions,
    ) -> Option<PeakMetrics> {
        let rows = self.rows_in_rt_window(rt_lo, rt_hi);
        if rows.len() < 2 {
            return None;
        }
        let dataset = self.dataset;
        let rt = &dataset.retention_time()[rows.clone()];
        let intensity: Vec<f64> = rows
            .map(|row| {
                let end = dataset.peak_count(row).saturating_sub(1);
                self.exact_sum(row, 0, end, mz_lo, mz_hi).unwrap_or(0.0)
            })
            .collect();

        let area = trapezoid(rt, &intensity);
        let min = intensity.iter().copied().fold(f64::INFINITY, f64::min);
        let max = intensity.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (first, last) = (rt[0], rt[rt.len() - 1]);

        Some(PeakMetrics {
            area,
            area_above_baseline: options
                .baseline_subtracted
                .then(|| area - min * (last - first)),
            height: options.height.then_some(max),
            baseline_height: options.baseline_height.then_some(min),
            rt_range: options.actual_rt_range.then_some((first, last)),
        })
    }
}
