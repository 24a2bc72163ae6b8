use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CodecError, ContainerVersion};
use crate::dataset::{InstrumentInfo, RtUnit, RunDataset, RunMetadata, ScanSettings, SpectrumKind};

/// Compression scheme named in the header
pub const COMPRESSION_ZLIB: &str = "zlib";

/// Header record following the preamble; declares the width of every
/// length field that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRecord {
    pub major: u8,
    pub minor: u8,
    pub mz_len_width: u8,
    pub intensity_len_width: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_index_len_width: Option<u8>,
    pub metadata_len_width: u8,
    pub compression: String,
}

impl HeaderRecord {
    pub fn for_version(version: ContainerVersion) -> Self {
        Self {
            major: version.major(),
            minor: version.minor(),
            mz_len_width: 10,
            intensity_len_width: 10,
            band_index_len_width: version.has_band_index().then_some(5),
            metadata_len_width: 5,
            compression: COMPRESSION_ZLIB.to_string(),
        }
    }

    /// Check the header against the preamble version
    pub fn check(&self, version: ContainerVersion) -> Result<(), CodecError> {
        if (self.major, self.minor) != (version.major(), version.minor()) {
            return Err(CodecError::Malformed(format!(
                "header declares version {}.{} but preamble says {}",
                self.major, self.minor, version
            )));
        }
        if self.compression != COMPRESSION_ZLIB {
            return Err(CodecError::Malformed(format!(
                "unknown compression '{}'",
                self.compression
            )));
        }
        if version.has_band_index() != self.band_index_len_width.is_some() {
            return Err(CodecError::Malformed(format!(
                "band index length field {} for version {}",
                if version.has_band_index() { "missing" } else { "unexpected" },
                version
            )));
        }
        let widths = [
            self.mz_len_width,
            self.intensity_len_width,
            self.band_index_len_width.unwrap_or(1),
            self.metadata_len_width,
        ];
        if let Some(bad) = widths.iter().find(|w| !(1..=16).contains(*w)) {
            return Err(CodecError::Malformed(format!("length field width {bad} out of range")));
        }
        Ok(())
    }
}

/// Run metadata stored as the last payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub spectrum_kind: SpectrumKind,
    pub retention_time: Vec<f64>,
    pub rt_unit: RtUnit,
    pub scan_settings: BTreeMap<String, String>,
    pub instrument: InstrumentInfo,
    /// `(row, first padded column)` for every scan narrower than the grid
    pub sentinel_starts: Vec<(usize, usize)>,
}

impl MetadataRecord {
    pub fn from_dataset(dataset: &RunDataset) -> Self {
        Self {
            spectrum_kind: dataset.spectrum_kind(),
            retention_time: dataset.retention_time().to_vec(),
            rt_unit: dataset.rt_unit(),
            scan_settings: dataset.settings().entries().clone(),
            instrument: dataset.settings().instrument().clone(),
            sentinel_starts: dataset.sentinel_starts(),
        }
    }

    /// Split into dataset metadata and the sentinel side table
    pub fn into_parts(self) -> (RunMetadata, Vec<(usize, usize)>) {
        let metadata = RunMetadata {
            spectrum_kind: self.spectrum_kind,
            retention_time: self.retention_time,
            rt_unit: self.rt_unit,
            settings: ScanSettings::from_entries(self.scan_settings, self.instrument),
        };
        (metadata, self.sentinel_starts)
    }
}
