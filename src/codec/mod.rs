//! # Container Codec
//!
//! Reads and writes `.rpd` run containers, one run per file:
//!
//! ```text
//! magic "\x13RAPID" | major u8 | minor u8 | identity hash (64 hex chars)
//! header_len u16 | header (JSON)
//! mz_len     | m/z payload        (delta coded, zlib)
//! int_len    | intensity payload  (delta coded, zlib)
//! band_len   | band index payload (zlib, 2.3 only)
//! meta_len   | metadata (JSON)
//! ```
//!
//! The identity hash is the SHA-256 of everything after the hash field. It
//! is verified on every load before any payload is parsed, and doubles as
//! the run's identity for deduplication.
//!
//! Values are delta coded on their IEEE-754 bit patterns with wrapping
//! integer arithmetic, so a round trip is bit-exact. Padded m/z slots are
//! written as zero and restored from the sentinel side table in the
//! metadata record.
//!
//! ```rust
//! use rpd::codec::{decode, encode, EncodeOptions};
//! use rpd::dataset::{RunDatasetBuilder, SpectrumKind};
//!
//! let dataset = RunDatasetBuilder::new(SpectrumKind::Discrete)
//!     .add_scan(0.0, vec![100.0, 101.0], vec![5.0, 6.0])
//!     .add_scan(0.5, vec![100.0], vec![7.0])
//!     .build()?;
//!
//! let encoded = encode(&dataset, &EncodeOptions::default())?;
//! let loaded = decode(&encoded.bytes)?;
//! assert_eq!(loaded.dataset.identity_hash(), Some(encoded.identity_hash.as_str()));
//! assert_eq!(loaded.dataset.mz(1, 1), None);
//! assert!(loaded.advisory.is_none());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod delta;
mod error;
mod payload;
mod records;

#[cfg(test)]
mod tests;

pub use error::CodecError;

use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::dataset::{PaddedArrays, RunDataset};
use delta::{Grid, COLUMN_AXIS, ROW_AXIS};
use records::{HeaderRecord, MetadataRecord};

/// File magic
pub const MAGIC: &[u8; 6] = b"\x13RAPID";

/// Length of the hex identity hash
pub const HASH_LEN: usize = 64;

/// Magic, version bytes and identity hash
pub const PREAMBLE_LEN: usize = MAGIC.len() + 2 + HASH_LEN;

const HEADER_LEN_WIDTH: usize = 2;

/// m/z: column axis twice, then scan axis
const MZ_AXES: [u8; 3] = [COLUMN_AXIS, COLUMN_AXIS, ROW_AXIS];
/// intensity: scan axis once
const INTENSITY_AXES: [u8; 1] = [ROW_AXIS];

/// Container format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContainerVersion {
    /// 2.2: no stored band index
    #[serde(rename = "2.2")]
    V2_2,
    /// 2.3: band index stored alongside the arrays
    #[default]
    #[serde(rename = "2.3")]
    V2_3,
}

impl ContainerVersion {
    /// Version written by default
    pub const CURRENT: ContainerVersion = ContainerVersion::V2_3;

    /// Every readable and writable version, oldest first
    pub const SUPPORTED: [ContainerVersion; 2] = [ContainerVersion::V2_2, ContainerVersion::V2_3];

    /// Major version byte
    pub fn major(&self) -> u8 {
        2
    }

    /// Minor version byte
    pub fn minor(&self) -> u8 {
        match self {
            ContainerVersion::V2_2 => 2,
            ContainerVersion::V2_3 => 3,
        }
    }

    /// Whether the band index is stored in the file
    pub fn has_band_index(&self) -> bool {
        *self >= ContainerVersion::V2_3
    }

    /// Map version bytes to a supported version
    pub fn from_parts(major: u8, minor: u8) -> Result<Self, CodecError> {
        match (major, minor) {
            (2, 2) => Ok(ContainerVersion::V2_2),
            (2, 3) => Ok(ContainerVersion::V2_3),
            _ => {
                let newer = (major, minor) > (Self::CURRENT.major(), Self::CURRENT.minor());
                Err(CodecError::UnsupportedVersion {
                    found: format!("{major}.{minor}"),
                    relation: if newer { "newer than" } else { "older than" },
                    supported: if newer {
                        Self::CURRENT.to_string()
                    } else {
                        Self::SUPPORTED[0].to_string()
                    },
                })
            }
        }
    }
}

impl fmt::Display for ContainerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

impl FromStr for ContainerVersion {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = s
            .trim()
            .split_once('.')
            .and_then(|(major, minor)| Some((major.parse::<u8>().ok()?, minor.parse::<u8>().ok()?)));
        match parsed {
            Some((major, minor)) => ContainerVersion::from_parts(major, minor),
            None => Err(CodecError::Malformed(format!("invalid version string '{s}'"))),
        }
    }
}

/// Encoding settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Version to write
    pub version: ContainerVersion,
    /// zlib level, 0-9
    pub compression_level: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            version: ContainerVersion::CURRENT,
            compression_level: 6,
        }
    }
}

impl EncodeOptions {
    /// Set the version to write
    pub fn with_version(mut self, version: ContainerVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the zlib level (clamped to 9)
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }
}

/// Encoded container bytes and their identity hash
#[derive(Debug, Clone)]
pub struct EncodedRun {
    /// Complete file contents
    pub bytes: Vec<u8>,
    /// Lowercase hex SHA-256 stored in the preamble
    pub identity_hash: String,
}

/// Result of loading a container
#[derive(Debug)]
pub struct LoadedRun {
    /// The decoded run, identity hash set
    pub dataset: RunDataset,
    /// Version the file was written with
    pub version: ContainerVersion,
    /// Non-fatal notice for the caller (set for legacy files)
    pub advisory: Option<String>,
}

/// Preamble fields, read without verifying the hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Major version byte
    pub major: u8,
    /// Minor version byte
    pub minor: u8,
    /// Stored identity hash
    pub identity_hash: String,
}

impl ContainerInfo {
    /// Supported version for the stored bytes
    pub fn version(&self) -> Result<ContainerVersion, CodecError> {
        ContainerVersion::from_parts(self.major, self.minor)
    }
}

/// Encode a dataset into container bytes
pub fn encode(dataset: &RunDataset, options: &EncodeOptions) -> Result<EncodedRun, CodecError> {
    let version = options.version;
    let level = options.compression_level.min(9);
    let header = HeaderRecord::for_version(version);
    let header_json = serde_json::to_vec(&header)?;
    let header_len = u16::try_from(header_json.len())
        .map_err(|_| CodecError::Malformed("header record too large".to_string()))?;

    let (rows, cols) = (dataset.scan_count(), dataset.width());
    let mz_bits = dataset
        .padded_mz()
        .iter()
        .map(|v| if v.is_nan() { 0 } else { v.to_bits() as i64 })
        .collect();
    let intensity_bits = dataset
        .padded_intensity()
        .iter()
        .map(|v| v.to_bits() as i64)
        .collect();
    let mz_payload = payload::pack_array(&delta::encode(Grid::new(rows, cols, mz_bits), &MZ_AXES), level)?;
    let intensity_payload = payload::pack_array(
        &delta::encode(Grid::new(rows, cols, intensity_bits), &INTENSITY_AXES),
        level,
    )?;
    let metadata = serde_json::to_vec(&MetadataRecord::from_dataset(dataset))?;

    let mut body = Vec::with_capacity(mz_payload.len() + intensity_payload.len() + metadata.len() + 256);
    body.extend_from_slice(&header_len.to_le_bytes());
    body.extend_from_slice(&header_json);
    write_section(&mut body, header.mz_len_width, &mz_payload, "m/z")?;
    write_section(&mut body, header.intensity_len_width, &intensity_payload, "intensity")?;
    if let Some(width) = header.band_index_len_width {
        let band = payload::pack_band(dataset.index(), level)?;
        write_section(&mut body, width, &band, "band index")?;
    }
    write_section(&mut body, header.metadata_len_width, &metadata, "metadata")?;

    let identity_hash = hash_hex(&body);
    log::debug!(
        "Encoded {} scans x {} columns as container {} ({} bytes)",
        rows,
        cols,
        version,
        PREAMBLE_LEN + body.len()
    );
    Ok(EncodedRun {
        bytes: frame(version.major(), version.minor(), &identity_hash, &body),
        identity_hash,
    })
}

/// Decode container bytes.
///
/// Checks run in order: preamble length, magic, version, identity hash,
/// then the payloads. Any failure aborts; no partial dataset is returned.
pub fn decode(bytes: &[u8]) -> Result<LoadedRun, CodecError> {
    let (version, computed, body) = verified_body(bytes)?;
    let BodySections {
        mz,
        intensity,
        band,
        metadata,
    } = split_body(body, version)?;

    let record: MetadataRecord = serde_json::from_slice(metadata)?;
    let (metadata, sentinel_starts) = record.into_parts();
    let mz_grid = delta::decode(payload::unpack_array(mz, "m/z")?)?;
    let intensity_grid = delta::decode(payload::unpack_array(intensity, "intensity")?)?;
    if (mz_grid.rows, mz_grid.cols) != (intensity_grid.rows, intensity_grid.cols) {
        return Err(CodecError::Malformed(format!(
            "m/z grid is {}x{} but intensity grid is {}x{}",
            mz_grid.rows, mz_grid.cols, intensity_grid.rows, intensity_grid.cols
        )));
    }

    let (rows, cols) = (mz_grid.rows, mz_grid.cols);
    let mut mz: Vec<f64> = mz_grid.data.into_iter().map(|b| f64::from_bits(b as u64)).collect();
    restore_sentinels(&mut mz, rows, cols, &sentinel_starts)?;
    let arrays = PaddedArrays {
        scan_count: rows,
        width: cols,
        mz,
        intensity: intensity_grid
            .data
            .into_iter()
            .map(|b| f64::from_bits(b as u64))
            .collect(),
    };

    let (mut dataset, advisory) = match band {
        Some(band) => {
            let index = payload::unpack_band(band)?;
            (RunDataset::from_padded_with_index(arrays, metadata, index)?, None)
        }
        None => {
            let advisory = format!(
                "container version {version} predates the stored band index; it was rebuilt on load, \
                 and very high m/z values may have lost precision in this version's m/z encoding"
            );
            log::warn!("{}", advisory);
            (RunDataset::from_padded(arrays, metadata)?, Some(advisory))
        }
    };
    dataset.set_identity(computed, None);
    Ok(LoadedRun {
        dataset,
        version,
        advisory,
    })
}

/// Sentinel side table exactly as stored in the metadata payload.
///
/// Preamble, version and hash are checked as in [`decode`]; the arrays are
/// left undecoded.
pub(crate) fn stored_sentinel_table(bytes: &[u8]) -> Result<Vec<(usize, usize)>, CodecError> {
    let (version, _, body) = verified_body(bytes)?;
    let sections = split_body(body, version)?;
    let record: MetadataRecord = serde_json::from_slice(sections.metadata)?;
    Ok(record.sentinel_starts)
}

/// Payload sections of a verified body
struct BodySections<'a> {
    mz: &'a [u8],
    intensity: &'a [u8],
    band: Option<&'a [u8]>,
    metadata: &'a [u8],
}

/// Check preamble, version and identity hash; returns the version, the
/// computed hash and the body.
fn verified_body(bytes: &[u8]) -> Result<(ContainerVersion, String, &[u8]), CodecError> {
    let info = parse_preamble(bytes)?;
    let version = info.version()?;
    let body = &bytes[PREAMBLE_LEN..];
    let computed = hash_hex(body);
    if info.identity_hash != computed {
        return Err(CodecError::HashMismatch {
            stored: info.identity_hash,
            computed,
        });
    }
    Ok((version, computed, body))
}

fn split_body(body: &[u8], version: ContainerVersion) -> Result<BodySections<'_>, CodecError> {
    let mut sections = Sections::new(body);
    let header_len = sections.read_len(HEADER_LEN_WIDTH as u8, "header length")?;
    let header: HeaderRecord = serde_json::from_slice(sections.take(header_len, "header")?)?;
    header.check(version)?;
    let mz = sections.section(header.mz_len_width, "m/z payload")?;
    let intensity = sections.section(header.intensity_len_width, "intensity payload")?;
    let band = header
        .band_index_len_width
        .map(|width| sections.section(width, "band index payload"))
        .transpose()?;
    let metadata = sections.section(header.metadata_len_width, "metadata payload")?;
    sections.finish()?;
    Ok(BodySections {
        mz,
        intensity,
        band,
        metadata,
    })
}

/// Wrap `body` in a preamble carrying its hash.
///
/// Produces well-framed input for decoder fuzzing and format tests.
pub fn frame_container(major: u8, minor: u8, body: &[u8]) -> Vec<u8> {
    frame(major, minor, &hash_hex(body), body)
}

/// Encode `dataset` and write it atomically to `path`; returns the
/// identity hash, which is also set on the dataset.
pub fn write_run(dataset: &mut RunDataset, path: impl AsRef<Path>, options: &EncodeOptions) -> Result<String, CodecError> {
    let path = path.as_ref();
    let encoded = encode(dataset, options).map_err(|e| e.at(path))?;
    persist_atomic(path, &encoded.bytes).map_err(|e| e.at(path))?;
    log::info!(
        "Wrote {} ({} scans, container {}, {} bytes)",
        path.display(),
        dataset.scan_count(),
        options.version,
        encoded.bytes.len()
    );
    dataset.set_identity(encoded.identity_hash.clone(), Some(path.to_path_buf()));
    Ok(encoded.identity_hash)
}

/// Load and verify a container file
pub fn read_run(path: impl AsRef<Path>) -> Result<LoadedRun, CodecError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| CodecError::from(e).at(path))?;
    let mut loaded = decode(&bytes).map_err(|e| e.at(path))?;
    let hash = loaded.dataset.identity_hash().unwrap_or_default().to_string();
    loaded.dataset.set_identity(hash, Some(path.to_path_buf()));
    log::info!(
        "Loaded {} ({} scans x {} columns, container {})",
        path.display(),
        loaded.dataset.scan_count(),
        loaded.dataset.width(),
        loaded.version
    );
    Ok(loaded)
}

/// Read only the preamble: magic, version bytes and stored hash
pub fn peek_container(path: impl AsRef<Path>) -> Result<ContainerInfo, CodecError> {
    let path = path.as_ref();
    let read = || -> Result<ContainerInfo, CodecError> {
        let mut preamble = Vec::with_capacity(PREAMBLE_LEN);
        File::open(path)?
            .take(PREAMBLE_LEN as u64)
            .read_to_end(&mut preamble)?;
        parse_preamble(&preamble)
    };
    read().map_err(|e| e.at(path))
}

fn parse_preamble(bytes: &[u8]) -> Result<ContainerInfo, CodecError> {
    let magic_len = bytes.len().min(MAGIC.len());
    if bytes[..magic_len] != MAGIC[..magic_len] {
        return Err(CodecError::BadMagic {
            found: bytes[..magic_len].to_vec(),
        });
    }
    if bytes.len() < PREAMBLE_LEN {
        return Err(CodecError::Truncated {
            section: "preamble",
            needed: PREAMBLE_LEN,
            available: bytes.len(),
        });
    }
    Ok(ContainerInfo {
        major: bytes[MAGIC.len()],
        minor: bytes[MAGIC.len() + 1],
        identity_hash: String::from_utf8_lossy(&bytes[MAGIC.len() + 2..PREAMBLE_LEN]).into_owned(),
    })
}

fn frame(major: u8, minor: u8, hash: &str, body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(PREAMBLE_LEN + body.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(major);
    bytes.push(minor);
    bytes.extend_from_slice(hash.as_bytes());
    bytes.extend_from_slice(body);
    bytes
}

fn hash_hex(body: &[u8]) -> String {
    format!("{:x}", Sha256::digest(body))
}

fn persist_atomic(path: &Path, bytes: &[u8]) -> Result<(), CodecError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

fn write_section(out: &mut Vec<u8>, width: u8, payload: &[u8], section: &str) -> Result<(), CodecError> {
    let width = width as usize;
    let len = payload.len() as u64;
    if width < 8 && len >> (8 * width) != 0 {
        return Err(CodecError::Malformed(format!(
            "{section} payload of {len} bytes does not fit a {width}-byte length field"
        )));
    }
    let le = len.to_le_bytes();
    let low = width.min(8);
    out.extend_from_slice(&le[..low]);
    out.resize(out.len() + (width - low), 0);
    out.extend_from_slice(payload);
    Ok(())
}

fn restore_sentinels(
    mz: &mut [f64],
    rows: usize,
    cols: usize,
    sentinel_starts: &[(usize, usize)],
) -> Result<(), CodecError> {
    for &(row, col) in sentinel_starts {
        if row >= rows || col >= cols {
            return Err(CodecError::Malformed(format!(
                "sentinel entry ({row}, {col}) outside a {rows}x{cols} grid"
            )));
        }
        let start = row * cols;
        mz[start + col..start + cols].fill(f64::NAN);
    }
    Ok(())
}

/// Sequential reader over the length-prefixed sections of a container body
struct Sections<'a> {
    bytes: &'a [u8],
}

impl<'a> Sections<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self, n: usize, section: &'static str) -> Result<&'a [u8], CodecError> {
        if n > self.bytes.len() {
            return Err(CodecError::Truncated {
                section,
                needed: n,
                available: self.bytes.len(),
            });
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    /// Little-endian length field; bytes beyond the eighth must be zero
    fn read_len(&mut self, width: u8, section: &'static str) -> Result<usize, CodecError> {
        let field = self.take(width as usize, section)?;
        let (low, high) = field.split_at(field.len().min(8));
        if high.iter().any(|b| *b != 0) {
            return Err(CodecError::Malformed(format!("{section}: length field overflows 64 bits")));
        }
        let mut le = [0u8; 8];
        le[..low.len()].copy_from_slice(low);
        let value = u64::from_le_bytes(le);
        usize::try_from(value).map_err(|_| CodecError::Malformed(format!("{section}: length {value} too large")))
    }

    fn section(&mut self, width: u8, section: &'static str) -> Result<&'a [u8], CodecError> {
        let len = self.read_len(width, section)?;
        self.take(len, section)
    }

    fn finish(self) -> Result<(), CodecError> {
        if self.bytes.is_empty() {
            Ok(())
        } else {
            Err(CodecError::Malformed(format!(
                "{} trailing bytes after metadata",
                self.bytes.len()
            )))
        }
    }
}
