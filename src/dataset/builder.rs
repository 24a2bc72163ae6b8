use super::{DatasetError, PaddedArrays, RunDataset, RunMetadata};
use super::{InstrumentInfo, RtUnit, ScanSettings, SpectrumKind};

/// One acquired scan before padding
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    /// Retention time of the scan
    pub retention_time: f64,
    /// Ascending m/z values
    pub mz: Vec<f64>,
    /// Intensities, one per m/z value
    pub intensity: Vec<f64>,
}

impl Scan {
    /// Create a scan from its peak lists
    pub fn new(retention_time: f64, mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        Self {
            retention_time,
            mz,
            intensity,
        }
    }

    /// Number of peaks in the scan
    pub fn peak_count(&self) -> usize {
        self.mz.len()
    }
}

/// Builder turning ragged scans into a padded [`RunDataset`].
///
/// This is the hand-over point for instrument-file converters: they push
/// scans in acquisition order and the builder pads every row to the widest
/// scan.
///
/// ```rust
/// use rpd::dataset::{RunDatasetBuilder, SpectrumKind};
///
/// let dataset = RunDatasetBuilder::new(SpectrumKind::Continuous)
///     .add_scan(0.0, vec![100.0, 101.0], vec![5.0, 7.0])
///     .add_scan(1.0, vec![100.0, 101.0, 102.0], vec![1.0, 2.0, 3.0])
///     .build()?;
///
/// assert_eq!(dataset.width(), 3);
/// assert_eq!(dataset.reference_row(), 1);
/// assert_eq!(dataset.mz(0, 2), None);
/// # Ok::<(), rpd::dataset::DatasetError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RunDatasetBuilder {
    spectrum_kind: SpectrumKind,
    rt_unit: RtUnit,
    settings: ScanSettings,
    scans: Vec<Scan>,
}

impl RunDatasetBuilder {
    /// Start a builder for the given spectrum kind
    pub fn new(spectrum_kind: SpectrumKind) -> Self {
        Self {
            spectrum_kind,
            rt_unit: RtUnit::default(),
            settings: ScanSettings::default(),
            scans: Vec::new(),
        }
    }

    /// Set the retention-time unit
    pub fn rt_unit(mut self, unit: RtUnit) -> Self {
        self.rt_unit = unit;
        self
    }

    /// Set the instrument descriptors, keeping existing settings
    pub fn instrument(mut self, instrument: InstrumentInfo) -> Self {
        self.settings = ScanSettings::from_entries(self.settings.entries().clone(), instrument);
        self
    }

    /// Add one run-level setting
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings = self.settings.with_entry(key, value);
        self
    }

    /// Replace all run-level settings
    pub fn settings(mut self, settings: ScanSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Append a scan given its peak lists
    pub fn add_scan(mut self, retention_time: f64, mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        self.scans.push(Scan::new(retention_time, mz, intensity));
        self
    }

    /// Append a scan in place (for loops)
    pub fn push_scan(&mut self, scan: Scan) {
        self.scans.push(scan);
    }

    /// Number of scans added so far
    pub fn scan_count(&self) -> usize {
        self.scans.len()
    }

    /// Pad the scans and build the dataset
    pub fn build(self) -> Result<RunDataset, DatasetError> {
        for (scan, s) in self.scans.iter().enumerate() {
            if s.mz.len() != s.intensity.len() {
                return Err(DatasetError::PeakArrayMismatch {
                    scan,
                    mz_len: s.mz.len(),
                    intensity_len: s.intensity.len(),
                });
            }
        }

        let scan_count = self.scans.len();
        let width = self.scans.iter().map(Scan::peak_count).max().unwrap_or(0);
        let mut mz = vec![f64::NAN; scan_count * width];
        let mut intensity = vec![0.0; scan_count * width];
        let mut retention_time = Vec::with_capacity(scan_count);

        for (row, scan) in self.scans.into_iter().enumerate() {
            let start = row * width;
            let n = scan.mz.len();
            mz[start..start + n].copy_from_slice(&scan.mz);
            intensity[start..start + n].copy_from_slice(&scan.intensity);
            retention_time.push(scan.retention_time);
        }

        RunDataset::from_padded(
            PaddedArrays {
                scan_count,
                width,
                mz,
                intensity,
            },
            RunMetadata {
                spectrum_kind: self.spectrum_kind,
                retention_time,
                rt_unit: self.rt_unit,
                settings: self.settings,
            },
        )
    }
}
