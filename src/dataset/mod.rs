//! # Run Dataset
//!
//! A [`RunDataset`] holds one LC-MS run as two dense, row-major grids:
//!
//! ```text
//!            col 0    col 1    col 2    col 3
//! scan 0   [ 100.0,   101.0,   NaN,     NaN   ]   m/z
//! scan 1   [ 100.0,   101.0,   102.0,   103.0 ]   <- reference row
//! scan 2   [ 100.1,   101.1,   102.1,   NaN   ]
//! ```
//!
//! Every row is padded to the widest scan. Padding is NaN for m/z and `0.0`
//! for intensity inside the buffers, but the public accessors return
//! `Option<f64>` and never leak the sentinel.
//!
//! The [`ExtractionIndex`](crate::index::ExtractionIndex) is built when the
//! dataset is constructed and stays valid for its whole life: isotope
//! subtraction edits intensities in place but never the m/z layout.

mod builder;
mod error;
mod stats;
mod types;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod tests;

pub use builder::{RunDatasetBuilder, Scan};
pub use error::DatasetError;
pub use stats::DatasetSummary;
pub use types::{setting_keys, InstrumentInfo, RtUnit, ScanSettings, SpectrumKind};

use std::path::{Path, PathBuf};

use crate::index::ExtractionIndex;
use crate::overlay::Overlay;

/// Padded m/z and intensity grids handed to [`RunDataset::from_padded`]
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedArrays {
    /// Number of scans (rows)
    pub scan_count: usize,
    /// Padded row width (columns)
    pub width: usize,
    /// Row-major m/z values, NaN in padded slots
    pub mz: Vec<f64>,
    /// Row-major intensities, zero in padded slots
    pub intensity: Vec<f64>,
}

/// Per-run metadata accompanying the padded grids
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    /// Centroided or profile data
    pub spectrum_kind: SpectrumKind,
    /// Retention time of each scan, non-decreasing
    pub retention_time: Vec<f64>,
    /// Unit of the retention-time axis
    pub rt_unit: RtUnit,
    /// Acquisition settings
    pub settings: ScanSettings,
}

/// One LC-MS run: padded m/z and intensity grids, RT axis, settings and the
/// derived band index.
#[derive(Debug, Clone)]
pub struct RunDataset {
    identity_hash: Option<String>,
    source_path: Option<PathBuf>,
    spectrum_kind: SpectrumKind,
    scan_count: usize,
    width: usize,
    mz: Vec<f64>,
    intensity: Vec<f64>,
    peak_counts: Vec<usize>,
    retention_time: Vec<f64>,
    rt_unit: RtUnit,
    settings: ScanSettings,
    index: ExtractionIndex,
    overlay: Overlay,
}

/// Mutable view used by isotope subtraction.
///
/// Splits the borrow so intensities and the overlay can be edited while the
/// m/z grid and RT axis stay readable.
pub(crate) struct SubtractionView<'a> {
    pub(crate) width: usize,
    pub(crate) mz: &'a [f64],
    pub(crate) intensity: &'a mut [f64],
    pub(crate) peak_counts: &'a [usize],
    pub(crate) retention_time: &'a [f64],
    pub(crate) overlay: &'a mut Overlay,
}

impl RunDataset {
    /// Validate padded grids and metadata, then build the band index.
    pub fn from_padded(arrays: PaddedArrays, metadata: RunMetadata) -> Result<Self, DatasetError> {
        let peak_counts = validate(&arrays, &metadata)?;
        let reference_row = reference_row(&peak_counts, arrays.width)?;
        let index = ExtractionIndex::build(&arrays.mz, &peak_counts, arrays.width, reference_row);
        log::debug!(
            "Built band index for {} scans x {} columns (reference row {})",
            arrays.scan_count,
            arrays.width,
            reference_row
        );
        Ok(Self::assemble(arrays, metadata, peak_counts, index))
    }

    /// Validate padded grids and metadata against an index loaded from disk.
    ///
    /// The index is checked structurally (length, bracket order, reference
    /// row) but not recomputed.
    pub(crate) fn from_padded_with_index(
        arrays: PaddedArrays,
        metadata: RunMetadata,
        index: ExtractionIndex,
    ) -> Result<Self, DatasetError> {
        let peak_counts = validate(&arrays, &metadata)?;
        let expected_reference = reference_row(&peak_counts, arrays.width)?;
        if index.reference_row() >= arrays.scan_count
            || peak_counts[index.reference_row()] != arrays.width
        {
            return Err(DatasetError::BandIndexMismatch(format!(
                "reference row {} is not a fully populated scan",
                index.reference_row()
            )));
        }
        if index.reference_row() != expected_reference {
            log::debug!(
                "Stored reference row {} differs from first full scan {}",
                index.reference_row(),
                expected_reference
            );
        }
        index.check_shape(arrays.width)?;
        Ok(Self::assemble(arrays, metadata, peak_counts, index))
    }

    fn assemble(
        arrays: PaddedArrays,
        metadata: RunMetadata,
        peak_counts: Vec<usize>,
        index: ExtractionIndex,
    ) -> Self {
        Self {
            identity_hash: None,
            source_path: None,
            spectrum_kind: metadata.spectrum_kind,
            scan_count: arrays.scan_count,
            width: arrays.width,
            mz: arrays.mz,
            intensity: arrays.intensity,
            overlay: Overlay::new(arrays.scan_count),
            peak_counts,
            retention_time: metadata.retention_time,
            rt_unit: metadata.rt_unit,
            settings: metadata.settings,
            index,
        }
    }

    /// Number of scans
    pub fn scan_count(&self) -> usize {
        self.scan_count
    }

    /// Padded row width (maximum peaks per scan)
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the run has no scans
    pub fn is_empty(&self) -> bool {
        self.scan_count == 0
    }

    /// Centroided or profile data
    pub fn spectrum_kind(&self) -> SpectrumKind {
        self.spectrum_kind
    }

    /// Retention time of each scan
    pub fn retention_time(&self) -> &[f64] {
        &self.retention_time
    }

    /// Retention-time unit
    pub fn rt_unit(&self) -> RtUnit {
        self.rt_unit
    }

    /// Acquisition settings
    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Fully populated scan anchoring the band index
    pub fn reference_row(&self) -> usize {
        self.index.reference_row()
    }

    /// Band index derived from the m/z grid
    pub fn index(&self) -> &ExtractionIndex {
        &self.index
    }

    /// Pre-subtraction records left by isotope subtraction
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Content fingerprint, set once the run has been written or loaded
    pub fn identity_hash(&self) -> Option<&str> {
        self.identity_hash.as_deref()
    }

    /// Container the run was loaded from or last saved to
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub(crate) fn set_identity(&mut self, hash: String, path: Option<PathBuf>) {
        self.identity_hash = Some(hash);
        if path.is_some() {
            self.source_path = path;
        }
    }

    /// Number of populated peaks in a scan (its first padded column)
    pub fn peak_count(&self, row: usize) -> usize {
        self.peak_counts.get(row).copied().unwrap_or(0)
    }

    /// Populated peak count of every scan
    pub fn peak_counts(&self) -> &[usize] {
        &self.peak_counts
    }

    /// m/z at `(row, col)`, `None` in the padded tail or out of bounds
    pub fn mz(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.scan_count && col < self.peak_counts[row] {
            Some(self.mz[row * self.width + col])
        } else {
            None
        }
    }

    /// Intensity at `(row, col)`, `None` in the padded tail or out of bounds
    pub fn intensity(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.scan_count && col < self.peak_counts[row] {
            Some(self.intensity[row * self.width + col])
        } else {
            None
        }
    }

    /// Populated m/z values of a scan
    pub fn row_mz(&self, row: usize) -> &[f64] {
        let start = row * self.width;
        &self.mz[start..start + self.peak_count(row)]
    }

    /// Populated intensities of a scan
    pub fn row_intensity(&self, row: usize) -> &[f64] {
        let start = row * self.width;
        &self.intensity[start..start + self.peak_count(row)]
    }

    /// Full padded m/z row, NaN in the tail
    pub(crate) fn padded_mz_row(&self, row: usize) -> &[f64] {
        let start = row * self.width;
        &self.mz[start..start + self.width]
    }

    /// Full padded intensity row, zero in the tail
    pub(crate) fn padded_intensity_row(&self, row: usize) -> &[f64] {
        let start = row * self.width;
        &self.intensity[start..start + self.width]
    }

    pub(crate) fn padded_mz(&self) -> &[f64] {
        &self.mz
    }

    pub(crate) fn padded_intensity(&self) -> &[f64] {
        &self.intensity
    }

    /// `(row, first padded column)` for every scan narrower than the grid
    pub fn sentinel_starts(&self) -> Vec<(usize, usize)> {
        self.peak_counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count < self.width)
            .map(|(row, &count)| (row, count))
            .collect()
    }

    /// Copy of the populated data as ragged scans
    pub fn scans(&self) -> Vec<Scan> {
        (0..self.scan_count)
            .map(|row| {
                Scan::new(
                    self.retention_time[row],
                    self.row_mz(row).to_vec(),
                    self.row_intensity(row).to_vec(),
                )
            })
            .collect()
    }

    pub(crate) fn subtraction_view(&mut self) -> SubtractionView<'_> {
        SubtractionView {
            width: self.width,
            mz: &self.mz,
            intensity: &mut self.intensity,
            peak_counts: &self.peak_counts,
            retention_time: &self.retention_time,
            overlay: &mut self.overlay,
        }
    }

    /// Summary figures for display
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            scan_count: self.scan_count,
            width: self.width,
            total_peaks: self.peak_counts.iter().sum(),
            spectrum_kind: self.spectrum_kind,
            rt_range: match (self.retention_time.first(), self.retention_time.last()) {
                (Some(&first), Some(&last)) => Some((first, last)),
                _ => None,
            },
            rt_unit: self.rt_unit,
            reference_row: self.reference_row(),
            settings_label: self.settings.short_label(),
            deisotoped_scans: self.overlay.touched_scans(),
        }
    }
}

/// Check shapes, RT axis and per-row padding; return per-row peak counts.
fn validate(arrays: &PaddedArrays, metadata: &RunMetadata) -> Result<Vec<usize>, DatasetError> {
    let PaddedArrays {
        scan_count,
        width,
        mz,
        intensity,
    } = arrays;
    let cells = scan_count.checked_mul(*width);
    if cells != Some(mz.len()) {
        return Err(DatasetError::ShapeMismatch {
            array: "mz",
            scans: *scan_count,
            width: *width,
            actual: mz.len(),
        });
    }
    if cells != Some(intensity.len()) {
        return Err(DatasetError::ShapeMismatch {
            array: "intensity",
            scans: *scan_count,
            width: *width,
            actual: intensity.len(),
        });
    }

    let rt = &metadata.retention_time;
    if rt.len() != *scan_count {
        return Err(DatasetError::RetentionTimeLength {
            expected: *scan_count,
            actual: rt.len(),
        });
    }
    for (index, &value) in rt.iter().enumerate() {
        if !value.is_finite() {
            return Err(DatasetError::NonFiniteRetentionTime { index });
        }
        if index > 0 && value < rt[index - 1] {
            return Err(DatasetError::RetentionTimeNotMonotonic {
                index,
                previous: rt[index - 1],
                current: value,
            });
        }
    }

    let mut peak_counts = Vec::with_capacity(*scan_count);
    for row in 0..*scan_count {
        let mz_row = &mz[row * width..(row + 1) * width];
        let intensity_row = &intensity[row * width..(row + 1) * width];
        let count = mz_row.iter().position(|v| v.is_nan()).unwrap_or(*width);

        for col in 0..count {
            let value = mz_row[col];
            if !value.is_finite() || (col > 0 && value <= mz_row[col - 1]) {
                return Err(DatasetError::UnsortedRow { row, col });
            }
        }
        for col in count..*width {
            if !mz_row[col].is_nan() {
                return Err(DatasetError::PaddingNotTrailing { row, col });
            }
            if intensity_row[col] != 0.0 {
                return Err(DatasetError::NonZeroPaddingIntensity { row, col });
            }
        }
        peak_counts.push(count);
    }
    Ok(peak_counts)
}

/// First fully populated scan
fn reference_row(peak_counts: &[usize], width: usize) -> Result<usize, DatasetError> {
    peak_counts
        .iter()
        .position(|&count| count == width)
        .ok_or(DatasetError::NoReferenceRow {
            scans: peak_counts.len(),
        })
}
