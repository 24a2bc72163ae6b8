use std::fmt;

use super::{RtUnit, SpectrumKind};

/// Summary figures of a loaded run, as shown by `rpd info`
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    /// Number of scans
    pub scan_count: usize,

    /// Padded row width (max peaks per scan)
    pub width: usize,

    /// Populated (non-padding) peaks across all scans
    pub total_peaks: usize,

    /// Spectrum kind
    pub spectrum_kind: SpectrumKind,

    /// First and last retention time, if any scans exist
    pub rt_range: Option<(f64, f64)>,

    /// Retention-time unit
    pub rt_unit: RtUnit,

    /// Fully populated scan anchoring the band index
    pub reference_row: usize,

    /// Compact acquisition label, e.g. `ESI+ TOF SCAN`
    pub settings_label: String,

    /// Scans currently carrying isotope-subtraction records
    pub deisotoped_scans: usize,
}

impl DatasetSummary {
    /// Fraction of the padded grid holding real peaks
    pub fn fill_ratio(&self) -> f64 {
        let cells = self.scan_count * self.width;
        if cells == 0 {
            return 0.0;
        }
        self.total_peaks as f64 / cells as f64
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run: {} scans x {} columns ({} peaks, {:.1}% filled), {}",
            self.scan_count,
            self.width,
            self.total_peaks,
            self.fill_ratio() * 100.0,
            self.spectrum_kind
        )?;
        if let Some((first, last)) = self.rt_range {
            write!(f, ", RT {:.3}-{:.3} {}", first, last, self.rt_unit)?;
        }
        if !self.settings_label.is_empty() {
            write!(f, ", {}", self.settings_label)?;
        }
        if self.deisotoped_scans > 0 {
            write!(f, ", {} deisotoped scans", self.deisotoped_scans)?;
        }
        Ok(())
    }
}
