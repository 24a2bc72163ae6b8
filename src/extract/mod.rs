//! # Extraction
//!
//! Read-only queries over a [`RunDataset`]: chromatograms for an m/z window,
//! averaged spectra for an RT window, and peak metrics (area, height,
//! baseline) for an m/z × RT box.
//!
//! Every query comes in two flavours chosen through [`ExtractionMode`]:
//!
//! - **Exact** filters every value against the requested window.
//! - **Fast** trusts the band index and the column grid: chromatograms sum
//!   the whole pre-sliced band and spectra average raw columns. This is only
//!   accurate when all scans share (nearly) the same m/z grid, so it must be
//!   an explicit caller choice.
//!
//! When the run carries isotope-subtraction records, chromatogram and
//! spectrum queries also return the signal as it was before subtraction.
//!
//! ```rust
//! use rpd::dataset::{RunDatasetBuilder, SpectrumKind};
//! use rpd::extract::{ExtractionMode, Extractor};
//!
//! let dataset = RunDatasetBuilder::new(SpectrumKind::Continuous)
//!     .add_scan(0.0, vec![100.0, 200.0], vec![1.0, 2.0])
//!     .add_scan(1.0, vec![100.0, 200.0], vec![3.0, 4.0])
//!     .build()?;
//!
//! let tic = Extractor::new(&dataset).total_ion_chromatogram(ExtractionMode::Exact);
//! assert_eq!(tic.current.intensity, vec![Some(3.0), Some(7.0)]);
//! # Ok::<(), rpd::dataset::DatasetError>(())
//! ```

mod auc;
mod chromatogram;
mod spectrum;


use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::dataset::RunDataset;
use crate::index::index_greater_than;

/// Exact filtering or the grid-trusting fast path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Filter every value against the window
    #[default]
    Exact,
    /// Approximate; assumes aligned m/z grids across scans
    Fast,
}

/// Intensity trace over retention time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chromatogram {
    /// Retention time of each point
    pub retention_time: Vec<f64>,
    /// Summed intensity, `None` where a scan had no value in the window
    pub intensity: Vec<Option<f64>>,
}

impl Chromatogram {
    /// Number of points
    pub fn len(&self) -> usize {
        self.retention_time.len()
    }

    /// Whether the trace has no points
    pub fn is_empty(&self) -> bool {
        self.retention_time.is_empty()
    }

    /// Intensities with missing points read as zero
    pub fn values_or_zero(&self) -> Vec<f64> {
        self.intensity.iter().map(|v| v.unwrap_or(0.0)).collect()
    }
}

/// Chromatogram query result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChromatogramExtraction {
    /// Trace over the current (possibly corrected) intensities
    pub current: Chromatogram,
    /// Trace before isotope subtraction, present when the run has records
    pub before_subtraction: Option<Chromatogram>,
}

/// Averaged mass spectrum
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spectrum {
    /// Ascending m/z values
    pub mz: Vec<f64>,
    /// Averaged intensities
    pub intensity: Vec<f64>,
}

impl Spectrum {
    /// Number of points
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    /// Whether the spectrum has no points
    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }
}

/// Spectrum query result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpectrumExtraction {
    /// Spectrum over the current (possibly corrected) intensities
    pub current: Spectrum,
    /// Pre-subtraction segments, one per contiguous run of touched columns
    pub before_subtraction: Option<Vec<Spectrum>>,
}

/// Optional outputs of [`Extractor::chromatogram_auc`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AucOptions {
    /// Report area above a flat baseline at the minimum intensity
    pub baseline_subtracted: bool,
    /// Report the maximum intensity
    pub height: bool,
    /// Report the minimum intensity
    pub baseline_height: bool,
    /// Report the first and last RT actually integrated
    pub actual_rt_range: bool,
}

impl AucOptions {
    /// Every optional output enabled
    pub fn all() -> Self {
        Self {
            baseline_subtracted: true,
            height: true,
            baseline_height: true,
            actual_rt_range: true,
        }
    }
}

/// Area and height figures of a chromatographic peak
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakMetrics {
    /// Trapezoidal area over RT
    pub area: f64,
    /// Area minus `min(intensity) * RT span`
    pub area_above_baseline: Option<f64>,
    /// Maximum intensity
    pub height: Option<f64>,
    /// Minimum intensity
    pub baseline_height: Option<f64>,
    /// RT of the first and last integrated scan
    pub rt_range: Option<(f64, f64)>,
}

/// Dense intensity sub-image over an m/z × RT box
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntensityWindow {
    /// Selected scans
    pub rows: Range<usize>,
    /// Selected reference-row columns
    pub columns: Range<usize>,
    /// RT of each selected scan
    pub retention_time: Vec<f64>,
    /// Reference-row m/z of each selected column
    pub mz: Vec<f64>,
    /// Row-major intensities, `rows.len() * columns.len()` values
    pub intensity: Vec<f64>,
}

/// Query engine over one run
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'a> {
    dataset: &'a RunDataset,
}

impl<'a> Extractor<'a> {
    /// Borrow a dataset for querying
    pub fn new(dataset: &'a RunDataset) -> Self {
        Self { dataset }
    }

    /// Dataset being queried
    pub fn dataset(&self) -> &'a RunDataset {
        self.dataset
    }

    /// Scans with retention time in `(rt_lo, rt_hi]`
    pub fn rows_in_rt_window(&self, rt_lo: f64, rt_hi: f64) -> Range<usize> {
        let rt = self.dataset.retention_time();
        let start = index_greater_than(rt_lo, rt);
        let end = index_greater_than(rt_hi, rt).max(start);
        start..end
    }

    /// Intensity sub-image for an m/z × RT box, on reference-row columns.
    ///
    /// Columns come from the reference row alone, so the image is only
    /// meaningful for runs with aligned grids.
    pub fn intensity_window(&self, mz_lo: f64, mz_hi: f64, rt_lo: f64, rt_hi: f64) -> IntensityWindow {
        let dataset = self.dataset;
        let width = dataset.width();
        let rows = self.rows_in_rt_window(rt_lo, rt_hi);
        if width == 0 || rows.is_empty() {
            return IntensityWindow {
                rows,
                ..Default::default()
            };
        }
        let reference = dataset.padded_mz_row(dataset.reference_row());
        let start = index_greater_than(mz_lo, reference).saturating_sub(1);
        let end = index_greater_than(mz_hi, reference).min(width - 1).max(start);
        let columns = start..end;

        let mut intensity = Vec::with_capacity(rows.len() * columns.len());
        for row in rows.clone() {
            intensity.extend_from_slice(&dataset.padded_intensity_row(row)[columns.clone()]);
        }
        IntensityWindow {
            retention_time: dataset.retention_time()[rows.clone()].to_vec(),
            mz: reference[columns.clone()].to_vec(),
            rows,
            columns,
            intensity,
        }
    }
}
