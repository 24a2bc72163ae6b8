//! # Container Validation
//!
//! Integrity report over an `.rpd` file. Unlike [`read_run`](crate::codec::read_run),
//! which stops at the first problem with an error, the validator records
//! every check it could run so the user sees how far the file got:
//!
//! 1. **Preamble**: magic bytes and a complete preamble
//! 2. **Version**: a container version this build reads
//! 3. **Identity hash**: SHA-256 of the contents matches the stored hash
//! 4. **Payloads**: header, arrays, band index and metadata decode into a
//!    run that satisfies the dataset invariants
//! 5. **Reference row**, **retention time**, **band index** and
//!    **sentinel padding** semantics of the decoded run
//!
//! ```rust,no_run
//! use rpd::validator::validate_rpd_file;
//! use std::path::Path;
//!
//! let report = validate_rpd_file(Path::new("run.rpd"))?;
//! println!("{}", report);
//! # Ok::<(), rpd::validator::ValidationError>(())
//! ```

use std::path::Path;

pub use report::{CheckStatus, ValidationCheck, ValidationReport};

mod report;

use crate::codec::{self, CodecError, ContainerVersion, LoadedRun};
use crate::dataset::RunDataset;
use crate::index::ExtractionIndex;

/// Check names, in report order
pub mod checks {
    /// Magic bytes and preamble length
    pub const PREAMBLE: &str = "Preamble";
    /// Supported container version
    pub const VERSION: &str = "Container version";
    /// Stored hash matches contents
    pub const IDENTITY_HASH: &str = "Identity hash";
    /// Payloads decode into a valid run
    pub const PAYLOADS: &str = "Payload decoding";
    /// A fully populated reference scan exists
    pub const REFERENCE_ROW: &str = "Reference row";
    /// Retention-time axis
    pub const RETENTION_TIME: &str = "Retention time axis";
    /// Stored band index against a fresh build
    pub const BAND_INDEX: &str = "Band index";
    /// Sentinel padding layout
    pub const SENTINELS: &str = "Sentinel padding";
}

/// Errors that prevent validation from running at all
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Validate one container file
pub fn validate_rpd_file(path: &Path) -> Result<ValidationReport, ValidationError> {
    let bytes = std::fs::read(path).map_err(|source| ValidationError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut report = ValidationReport::new(path.display().to_string());
    validate_bytes(&bytes, &mut report);
    log::debug!(
        "Validated {}: {} passed, {} warnings, {} failed",
        path.display(),
        report.success_count(),
        report.warning_count(),
        report.failure_count()
    );
    Ok(report)
}

/// Run every check against in-memory container bytes
pub fn validate_bytes(bytes: &[u8], report: &mut ValidationReport) {
    let loaded = match codec::decode(bytes) {
        Ok(loaded) => {
            report.add_check(ValidationCheck::ok(checks::PREAMBLE));
            report.add_check(ValidationCheck::ok(checks::VERSION));
            report.add_check(ValidationCheck::ok(checks::IDENTITY_HASH));
            report.add_check(ValidationCheck::ok(checks::PAYLOADS));
            loaded
        }
        Err(err) => {
            record_decode_failure(&err, report);
            return;
        }
    };
    check_version_advisory(&loaded, report);
    check_run(&loaded, report);
    check_sentinels(bytes, &loaded.dataset, report);
}

/// Mark the checks passed before the failing stage, then the failure
fn record_decode_failure(err: &CodecError, report: &mut ValidationReport) {
    let failed_stage = match err.root() {
        CodecError::BadMagic { .. } => 0,
        CodecError::Truncated {
            section: "preamble", ..
        } => 0,
        CodecError::UnsupportedVersion { .. } => 1,
        CodecError::HashMismatch { .. } => 2,
        _ => 3,
    };
    let stages = [
        checks::PREAMBLE,
        checks::VERSION,
        checks::IDENTITY_HASH,
        checks::PAYLOADS,
    ];
    for name in &stages[..failed_stage] {
        report.add_check(ValidationCheck::ok(*name));
    }
    report.add_check(ValidationCheck::failed(stages[failed_stage], err.to_string()));
}

fn check_version_advisory(loaded: &LoadedRun, report: &mut ValidationReport) {
    if let Some(advisory) = &loaded.advisory {
        report.add_check(ValidationCheck::warning(
            format!("{} {}", checks::VERSION, loaded.version),
            advisory.clone(),
        ));
    } else if loaded.version < ContainerVersion::CURRENT {
        report.add_check(ValidationCheck::warning(
            format!("{} {}", checks::VERSION, loaded.version),
            format!("written by an older format; current is {}", ContainerVersion::CURRENT),
        ));
    }
}

fn check_run(loaded: &LoadedRun, report: &mut ValidationReport) {
    let dataset = &loaded.dataset;

    let reference = dataset.reference_row();
    let first_full = dataset.peak_counts().iter().position(|&c| c == dataset.width());
    if first_full == Some(reference) {
        report.add_check(ValidationCheck::ok(checks::REFERENCE_ROW));
    } else {
        report.add_check(ValidationCheck::warning(
            checks::REFERENCE_ROW,
            format!(
                "stored reference row {reference} is fully populated but not the first such scan ({first_full:?})"
            ),
        ));
    }

    let rt = dataset.retention_time();
    let repeated = rt.windows(2).filter(|w| w[0] == w[1]).count();
    if rt.len() < 2 {
        report.add_check(ValidationCheck::warning(
            checks::RETENTION_TIME,
            format!("{} scan(s); no chromatographic dimension", rt.len()),
        ));
    } else if repeated > 0 {
        report.add_check(ValidationCheck::warning(
            checks::RETENTION_TIME,
            format!("{repeated} repeated retention times"),
        ));
    } else {
        report.add_check(ValidationCheck::ok(checks::RETENTION_TIME));
    }

    let fresh = ExtractionIndex::build(
        dataset.padded_mz(),
        dataset.peak_counts(),
        dataset.width(),
        reference,
    );
    let stored = dataset.index();
    if *stored == fresh {
        report.add_check(ValidationCheck::ok(checks::BAND_INDEX));
    } else if stored.covers(&fresh) {
        report.add_check(ValidationCheck::warning(
            checks::BAND_INDEX,
            "stored brackets are wider than the data requires; fast extraction sums extra columns",
        ));
    } else {
        report.add_check(ValidationCheck::failed(
            checks::BAND_INDEX,
            "stored brackets are narrower than the data requires; extraction can miss peaks",
        ));
    }
}

/// Compare the stored sentinel side table with the padding of the decoded
/// grid: one entry per padded scan, rows strictly ascending.
fn check_sentinels(bytes: &[u8], dataset: &RunDataset, report: &mut ValidationReport) {
    let stored = match codec::stored_sentinel_table(bytes) {
        Ok(stored) => stored,
        Err(err) => {
            report.add_check(ValidationCheck::failed(checks::SENTINELS, err.to_string()));
            return;
        }
    };

    let mut problems = Vec::new();
    if let Some(w) = stored.windows(2).find(|w| w[1].0 <= w[0].0) {
        problems.push(format!("row {} listed after row {}", w[1].0, w[0].0));
    }
    for &(row, col) in &stored {
        if row >= dataset.scan_count() {
            problems.push(format!("row {row} is outside the run"));
        } else if dataset.peak_count(row) != col {
            problems.push(format!(
                "row {row} listed as padded from column {col} but holds {} peaks",
                dataset.peak_count(row)
            ));
        }
    }
    for (row, col) in dataset.sentinel_starts() {
        if !stored.iter().any(|&(r, _)| r == row) {
            problems.push(format!("row {row} is padded from column {col} but not listed"));
        }
    }

    if problems.is_empty() {
        report.add_check(ValidationCheck::ok(format!(
            "{} ({} padded scans)",
            checks::SENTINELS,
            stored.len()
        )));
    } else {
        report.add_check(ValidationCheck::failed(checks::SENTINELS, problems.join("; ")));
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::codec::{encode, EncodeOptions, PREAMBLE_LEN};
    use crate::dataset::fixtures::three_scan_run;
    use crate::dataset::{PaddedArrays, RunDataset, RunMetadata};

    fn container(dataset: &RunDataset, options: EncodeOptions) -> Vec<u8> {
        encode(dataset, &options).unwrap().bytes
    }

    fn validate(bytes: &[u8]) -> ValidationReport {
        let mut report = ValidationReport::new("memory");
        validate_bytes(bytes, &mut report);
        report
    }

    fn with_index(lower: Vec<usize>, upper: Vec<usize>) -> RunDataset {
        let base = three_scan_run();
        let arrays = PaddedArrays {
            scan_count: base.scan_count(),
            width: base.width(),
            mz: base.padded_mz().to_vec(),
            intensity: base.padded_intensity().to_vec(),
        };
        let metadata = RunMetadata {
            spectrum_kind: base.spectrum_kind(),
            retention_time: base.retention_time().to_vec(),
            rt_unit: base.rt_unit(),
            settings: base.settings().clone(),
        };
        let index = ExtractionIndex::from_parts(base.reference_row(), lower, upper);
        RunDataset::from_padded_with_index(arrays, metadata, index).unwrap()
    }

    /// Re-frame a container with its stored sentinel table replaced
    fn with_sentinel_table(bytes: &[u8], table: &str) -> Vec<u8> {
        let body = &bytes[PREAMBLE_LEN..];
        let needle = b"{\"spectrum_kind\"";
        let metadata_start = body.windows(needle.len()).position(|w| w == needle).unwrap();
        let metadata = std::str::from_utf8(&body[metadata_start..]).unwrap();
        let edited = metadata.replace("\"sentinel_starts\":[[0,3],[2,2]]", &format!("\"sentinel_starts\":{table}"));
        assert_ne!(edited, metadata);

        let mut new_body = body[..metadata_start - 5].to_vec();
        new_body.extend_from_slice(&(edited.len() as u64).to_le_bytes()[..5]);
        new_body.extend_from_slice(edited.as_bytes());
        codec::frame_container(2, 3, &new_body)
    }

    #[test]
    fn test_report_display() {
        let mut report = ValidationReport::new("test.rpd");
        report.add_check(ValidationCheck::ok("Check 1"));
        report.add_check(ValidationCheck::warning("Check 2", "a warning"));
        report.add_check(ValidationCheck::failed("Check 3", "a failure"));

        let output = format!("{}", report);
        assert!(output.contains("✓"));
        assert!(output.contains("⚠"));
        assert!(output.contains("✗"));
        assert!(output.contains("1 passed, 1 warnings, 1 failed"));
        assert!(output.contains("Validation FAILED"));
    }

    #[test]
    fn test_valid_container_passes() {
        let report = validate(&container(&three_scan_run(), EncodeOptions::default()));
        assert!(!report.has_failures());
        assert!(!report.has_warnings(), "{report}");
        assert_eq!(report.check(checks::BAND_INDEX).unwrap().status, CheckStatus::Ok);
        assert!(report.to_string().contains("Sentinel padding (2 padded scans)"));
    }

    #[test]
    fn test_legacy_container_warns() {
        let options = EncodeOptions::default().with_version(ContainerVersion::V2_2);
        let report = validate(&container(&three_scan_run(), options));
        assert!(!report.has_failures());
        assert_eq!(report.warning_count(), 1);
        assert!(report.check("Container version 2.2").is_some());
    }

    #[test]
    fn test_hash_failure_keeps_earlier_checks() {
        let mut bytes = container(&three_scan_run(), EncodeOptions::default());
        bytes[PREAMBLE_LEN + 3] ^= 0x20;
        let report = validate(&bytes);
        assert_eq!(report.success_count(), 2);
        assert!(matches!(
            report.check(checks::IDENTITY_HASH).unwrap().status,
            CheckStatus::Failed(_)
        ));
        assert!(report.check(checks::PAYLOADS).is_none());
    }

    #[test]
    fn test_bad_magic_fails_first_check() {
        let report = validate(b"PK\x03\x04 zip archive");
        assert_eq!(report.checks.len(), 1);
        assert!(report.has_failures());
        assert!(matches!(
            report.check(checks::PREAMBLE).unwrap().status,
            CheckStatus::Failed(_)
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let report = validate(&codec::frame_container(9, 0, b""));
        assert_eq!(report.success_count(), 1);
        let status = &report.check(checks::VERSION).unwrap().status;
        assert!(matches!(status, CheckStatus::Failed(m) if m.contains("9.0")));
    }

    #[test]
    fn test_loose_band_index_warns() {
        let dataset = with_index(vec![0; 4], vec![3; 4]);
        let report = validate(&container(&dataset, EncodeOptions::default()));
        assert!(matches!(
            report.check(checks::BAND_INDEX).unwrap().status,
            CheckStatus::Warning(_)
        ));
        assert!(!report.has_failures());
    }

    #[test]
    fn test_narrow_band_index_fails() {
        let dataset = with_index(vec![0, 1, 2, 3], vec![0, 1, 2, 3]);
        let report = validate(&container(&dataset, EncodeOptions::default()));
        assert!(matches!(
            report.check(checks::BAND_INDEX).unwrap().status,
            CheckStatus::Failed(_)
        ));
    }

    #[test]
    fn test_validate_file_and_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.rpd");
        std::fs::write(&path, container(&three_scan_run(), EncodeOptions::default())).unwrap();
        let report = validate_rpd_file(&path).unwrap();
        assert_eq!(report.failure_count(), 0);
        assert!(report.file_path.ends_with("run.rpd"));

        let missing = dir.path().join("nope.rpd");
        assert!(matches!(
            validate_rpd_file(&missing),
            Err(ValidationError::Io { .. })
        ));
    }

    #[test]
    fn test_sentinel_table_mismatch_fails() {
        let bytes = container(&three_scan_run(), EncodeOptions::default());

        // duplicated row: still decodes, but the table is not one entry per scan
        let report = validate(&with_sentinel_table(&bytes, "[[0,3],[0,3],[2,2]]"));
        assert_eq!(report.check(checks::PAYLOADS).unwrap().status, CheckStatus::Ok);
        let status = &report.check(checks::SENTINELS).unwrap().status;
        assert!(matches!(status, CheckStatus::Failed(m) if m.contains("row 0 listed after row 0")), "{report}");

        let report = validate(&with_sentinel_table(&bytes, "[[2,2],[0,3]]"));
        assert_eq!(report.check(checks::PAYLOADS).unwrap().status, CheckStatus::Ok);
        assert!(matches!(
            report.check(checks::SENTINELS).unwrap().status,
            CheckStatus::Failed(_)
        ));
    }
}
