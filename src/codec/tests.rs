use tempfile::tempdir;

use super::delta::{self, Grid, COLUMN_AXIS, ROW_AXIS};
use super::*;
use crate::dataset::fixtures::{aligned_run, jittered_run, three_scan_run};
use crate::dataset::{RtUnit, RunDatasetBuilder, SpectrumKind};

fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}

fn assert_same_run(a: &RunDataset, b: &RunDataset) {
    assert_eq!(a.scan_count(), b.scan_count());
    assert_eq!(a.width(), b.width());
    assert_eq!(bits(a.padded_mz()), bits(b.padded_mz()));
    assert_eq!(bits(a.padded_intensity()), bits(b.padded_intensity()));
    assert_eq!(a.retention_time(), b.retention_time());
    assert_eq!(a.rt_unit(), b.rt_unit());
    assert_eq!(a.spectrum_kind(), b.spectrum_kind());
    assert_eq!(a.settings(), b.settings());
    assert_eq!(a.sentinel_starts(), b.sentinel_starts());
    assert_eq!(a.index(), b.index());
}

/// Offset of the m/z length field within the body
fn mz_length_offset(bytes: &[u8]) -> usize {
    let header_len = u16::from_le_bytes([bytes[PREAMBLE_LEN], bytes[PREAMBLE_LEN + 1]]) as usize;
    2 + header_len
}

// ==================== Delta coding ====================

#[test]
fn test_delta_round_trip_all_axes() {
    let data: Vec<i64> = (0..12).map(|v| v * v - 7).collect();
    let grid = Grid::new(3, 4, data);
    let encoded = delta::encode(grid.clone(), &[COLUMN_AXIS, COLUMN_AXIS, ROW_AXIS]);
    assert_eq!(encoded.axes, vec![COLUMN_AXIS, COLUMN_AXIS, ROW_AXIS]);
    assert_eq!((encoded.residual.rows, encoded.residual.cols), (2, 2));
    assert_eq!(delta::decode(encoded).unwrap(), grid);
}

#[test]
fn test_delta_skips_exhausted_axis() {
    let grid = Grid::new(2, 1, vec![5, 9]);
    let encoded = delta::encode(grid.clone(), &[COLUMN_AXIS, COLUMN_AXIS, ROW_AXIS]);
    // one column: the first step empties the axis, the second is skipped
    assert_eq!(encoded.axes, vec![COLUMN_AXIS, ROW_AXIS]);
    assert_eq!(delta::decode(encoded).unwrap(), grid);
}

#[test]
fn test_delta_wraps_on_extreme_values() {
    let grid = Grid::new(1, 3, vec![i64::MIN, i64::MAX, 0]);
    let encoded = delta::encode(grid.clone(), &[COLUMN_AXIS, COLUMN_AXIS]);
    assert_eq!(delta::decode(encoded).unwrap(), grid);
}

#[test]
fn test_delta_rejects_bad_seed() {
    let mut encoded = delta::encode(Grid::new(2, 2, vec![1, 2, 3, 4]), &[ROW_AXIS]);
    encoded.seeds[0].pop();
    assert!(matches!(delta::decode(encoded), Err(CodecError::Malformed(_))));
}

#[test]
fn test_delta_rejects_residual_shape_mismatch() {
    // zero cells, so the size check alone passes
    let encoded = delta::DeltaEncoded {
        rows: 3,
        cols: 0,
        axes: vec![ROW_AXIS],
        seeds: vec![Vec::new()],
        residual: Grid::new(usize::MAX, 0, Vec::new()),
    };
    assert!(matches!(delta::decode(encoded), Err(CodecError::Malformed(_))));

    let encoded = delta::DeltaEncoded {
        rows: usize::MAX,
        cols: 0,
        axes: vec![ROW_AXIS, ROW_AXIS],
        seeds: vec![Vec::new(), Vec::new()],
        residual: Grid::new(usize::MAX, 0, Vec::new()),
    };
    assert!(matches!(delta::decode(encoded), Err(CodecError::Malformed(_))));
}

#[test]
fn test_delta_rejects_step_over_empty_axis() {
    let encoded = delta::DeltaEncoded {
        rows: 2,
        cols: 0,
        axes: vec![COLUMN_AXIS],
        seeds: vec![vec![0, 0]],
        residual: Grid::new(2, 0, Vec::new()),
    };
    assert!(matches!(delta::decode(encoded), Err(CodecError::Malformed(_))));
}

// ==================== Round trip ====================

#[test]
fn test_round_trip_preserves_run() {
    let dataset = three_scan_run();
    let encoded = encode(&dataset, &EncodeOptions::default()).unwrap();
    assert_eq!(&encoded.bytes[..6], MAGIC);
    assert_eq!(encoded.bytes[6..8], [2, 3]);
    assert_eq!(encoded.identity_hash.len(), HASH_LEN);

    let loaded = decode(&encoded.bytes).unwrap();
    assert_eq!(loaded.version, ContainerVersion::V2_3);
    assert!(loaded.advisory.is_none());
    assert_same_run(&dataset, &loaded.dataset);
    assert_eq!(loaded.dataset.identity_hash(), Some(encoded.identity_hash.as_str()));
    assert_eq!(loaded.dataset.mz(2, 2), None);
}

#[test]
fn test_round_trip_is_bit_exact() {
    let dataset = RunDatasetBuilder::new(SpectrumKind::Continuous)
        .rt_unit(RtUnit::Seconds)
        .add_scan(0.1, vec![1e-300, 0.1 + 0.2, 1e300], vec![-0.0, f64::MIN_POSITIVE / 2.0, 3.5])
        .add_scan(0.30000000000000004, vec![2.0], vec![1.0])
        .build()
        .unwrap();
    let loaded = decode(&encode(&dataset, &EncodeOptions::default()).unwrap().bytes).unwrap();
    assert_same_run(&dataset, &loaded.dataset);
}

#[test]
fn test_encoding_is_deterministic() {
    let dataset = jittered_run(20, 30, 100.0, 0.01);
    let a = encode(&dataset, &EncodeOptions::default()).unwrap();
    let b = encode(&dataset, &EncodeOptions::default()).unwrap();
    assert_eq!(a.identity_hash, b.identity_hash);
    let other = encode(&aligned_run(20, 30, 100.0, 0.01), &EncodeOptions::default()).unwrap();
    assert_ne!(a.identity_hash, other.identity_hash);
}

#[test]
fn test_legacy_version_rebuilds_index() {
    let dataset = jittered_run(8, 12, 250.0, 0.05);
    let options = EncodeOptions::default().with_version(ContainerVersion::V2_2);
    let encoded = encode(&dataset, &options).unwrap();
    assert_eq!(encoded.bytes[6..8], [2, 2]);

    let loaded = decode(&encoded.bytes).unwrap();
    assert_eq!(loaded.version, ContainerVersion::V2_2);
    assert!(loaded.advisory.as_deref().unwrap().contains("2.2"));
    assert_same_run(&dataset, &loaded.dataset);
}

#[test]
fn test_compression_level_zero_still_loads() {
    let dataset = aligned_run(5, 6, 400.0, 1.0);
    let options = EncodeOptions::default().with_compression_level(0);
    let loaded = decode(&encode(&dataset, &options).unwrap().bytes).unwrap();
    assert_same_run(&dataset, &loaded.dataset);
}

// ==================== Format errors ====================

#[test]
fn test_corrupted_hash_fails() {
    let mut bytes = encode(&three_scan_run(), &EncodeOptions::default()).unwrap().bytes;
    bytes[MAGIC.len() + 2] = if bytes[MAGIC.len() + 2] == b'0' { b'1' } else { b'0' };
    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, CodecError::HashMismatch { .. }));
    assert!(err.is_format_error());
}

#[test]
fn test_corrupted_payload_fails() {
    let mut bytes = encode(&three_scan_run(), &EncodeOptions::default()).unwrap().bytes;
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    assert!(matches!(decode(&bytes), Err(CodecError::HashMismatch { .. })));
}

#[test]
fn test_bad_magic_and_truncation() {
    assert!(matches!(decode(b"PK\x03\x04"), Err(CodecError::BadMagic { .. })));
    assert!(matches!(
        decode(b"\x13RAP"),
        Err(CodecError::Truncated { section: "preamble", .. })
    ));
    assert!(matches!(
        decode(b""),
        Err(CodecError::Truncated { available: 0, .. })
    ));

    let bytes = encode(&three_scan_run(), &EncodeOptions::default()).unwrap().bytes;
    assert!(matches!(
        decode(&bytes[..bytes.len() - 10]),
        Err(CodecError::HashMismatch { .. })
    ));
}

#[test]
fn test_unsupported_versions() {
    let err = decode(&frame_container(2, 4, b"")).unwrap_err();
    assert_eq!(err.to_string(), "container version 2.4 is newer than supported 2.3");
    let err = decode(&frame_container(1, 9, b"")).unwrap_err();
    assert_eq!(err.to_string(), "container version 1.9 is older than supported 2.2");
    assert!(matches!(
        "3.0".parse::<ContainerVersion>(),
        Err(CodecError::UnsupportedVersion { .. })
    ));
    assert_eq!("2.2".parse::<ContainerVersion>().unwrap(), ContainerVersion::V2_2);
}

#[test]
fn test_framed_garbage_is_rejected() {
    for body in [&b""[..], b"\x05\x00{}", b"\xff\xff", b"\x02\x00{}xxxxxxxxxxxxxxxxxxxx"] {
        let err = decode(&frame_container(2, 3, body)).unwrap_err();
        assert!(err.is_format_error(), "{err}");
    }
}

#[test]
fn test_length_field_high_bytes_must_be_zero() {
    let bytes = encode(&three_scan_run(), &EncodeOptions::default()).unwrap().bytes;
    let mut body = bytes[PREAMBLE_LEN..].to_vec();
    let offset = mz_length_offset(&bytes);
    body[offset + 9] = 1;
    let err = decode(&frame_container(2, 3, &body)).unwrap_err();
    assert!(matches!(err, CodecError::Malformed(ref m) if m.contains("64 bits")), "{err}");
}

#[test]
fn test_header_version_must_match_preamble() {
    let bytes = encode(&three_scan_run(), &EncodeOptions::default()).unwrap().bytes;
    // 2.3 body behind a 2.2 preamble
    let err = decode(&frame_container(2, 2, &bytes[PREAMBLE_LEN..])).unwrap_err();
    assert!(matches!(err, CodecError::Malformed(_)), "{err}");
}

#[test]
fn test_missing_sentinel_entry_is_rejected() {
    let dataset = three_scan_run();
    let encoded = encode(&dataset, &EncodeOptions::default()).unwrap();
    let text = String::from_utf8_lossy(&encoded.bytes).into_owned();
    assert!(text.contains("\"sentinel_starts\":[[0,3],[2,2]]"));

    // Rebuild the body with an emptied side table
    let body = &encoded.bytes[PREAMBLE_LEN..];
    let needle = b"{\"spectrum_kind\"";
    let metadata_start = body.windows(needle.len()).position(|w| w == needle).unwrap();
    let metadata = std::str::from_utf8(&body[metadata_start..]).unwrap();
    let edited = metadata.replace("[[0,3],[2,2]]", "[]");

    let mut new_body = body[..metadata_start - 5].to_vec();
    new_body.extend_from_slice(&(edited.len() as u64).to_le_bytes()[..5]);
    new_body.extend_from_slice(edited.as_bytes());
    let err = decode(&frame_container(2, 3, &new_body)).unwrap_err();
    assert!(matches!(err, CodecError::Dataset(_)), "{err}");
}

#[test]
fn test_hashed_container_with_oversized_residual_is_rejected() {
    let dataset = three_scan_run();
    let header = HeaderRecord::for_version(ContainerVersion::V2_2);
    let header_json = serde_json::to_vec(&header).unwrap();
    let array = payload::pack_array(
        &delta::DeltaEncoded {
            rows: 3,
            cols: 0,
            axes: vec![ROW_AXIS],
            seeds: vec![Vec::new()],
            residual: Grid::new(usize::MAX, 0, Vec::new()),
        },
        6,
    )
    .unwrap();
    let metadata = serde_json::to_vec(&MetadataRecord::from_dataset(&dataset)).unwrap();

    let mut body = (header_json.len() as u16).to_le_bytes().to_vec();
    body.extend_from_slice(&header_json);
    write_section(&mut body, header.mz_len_width, &array, "m/z").unwrap();
    write_section(&mut body, header.intensity_len_width, &array, "intensity").unwrap();
    write_section(&mut body, header.metadata_len_width, &metadata, "metadata").unwrap();

    // the hash is valid, so this reaches the payload decoder
    let err = decode(&frame_container(2, 2, &body)).unwrap_err();
    assert!(matches!(err, CodecError::Malformed(_)), "{err}");
}

// ==================== Files ====================

#[test]
fn test_write_then_read_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.rpd");
    let mut dataset = three_scan_run();
    assert!(dataset.identity_hash().is_none());

    let hash = write_run(&mut dataset, &path, &EncodeOptions::default()).unwrap();
    assert_eq!(dataset.identity_hash(), Some(hash.as_str()));
    assert_eq!(dataset.source_path(), Some(path.as_path()));

    let info = peek_container(&path).unwrap();
    assert_eq!(info.identity_hash, hash);
    assert_eq!(info.version().unwrap(), ContainerVersion::V2_3);

    let loaded = read_run(&path).unwrap();
    assert_same_run(&dataset, &loaded.dataset);
    assert_eq!(loaded.dataset.source_path(), Some(path.as_path()));

    // no stray temp files next to the container
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_overwrite_is_atomic_replacement() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.rpd");
    let mut first = three_scan_run();
    let mut second = aligned_run(4, 4, 100.0, 1.0);
    write_run(&mut first, &path, &EncodeOptions::default()).unwrap();
    let hash = write_run(&mut second, &path, &EncodeOptions::default()).unwrap();
    assert_eq!(peek_container(&path).unwrap().identity_hash, hash);
}

#[test]
fn test_file_errors_carry_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.rpd");
    let err = read_run(&path).unwrap_err();
    assert!(err.to_string().contains("missing.rpd"));
    assert!(!err.is_format_error());

    std::fs::write(&path, b"not a container at all, just text").unwrap();
    let err = read_run(&path).unwrap_err();
    assert!(err.is_format_error());
    assert!(matches!(err.root(), CodecError::BadMagic { .. }));
}
