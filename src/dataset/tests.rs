use super::fixtures::{positive_tof_settings, three_scan_run};
use super::*;

fn metadata(rt: Vec<f64>) -> RunMetadata {
    RunMetadata {
        spectrum_kind: SpectrumKind::Discrete,
        retention_time: rt,
        rt_unit: RtUnit::Seconds,
        settings: ScanSettings::default(),
    }
}

// ==================== Construction ====================

#[test]
fn test_reference_row_is_first_full_scan() {
    let dataset = three_scan_run();
    assert_eq!(dataset.scan_count(), 3);
    assert_eq!(dataset.width(), 4);
    assert_eq!(dataset.reference_row(), 1);
    assert_eq!(dataset.peak_counts(), &[3, 4, 2]);
}

#[test]
fn test_padding_is_hidden_behind_option() {
    let dataset = three_scan_run();
    assert_eq!(dataset.mz(0, 2), Some(102.0));
    assert_eq!(dataset.mz(0, 3), None);
    assert_eq!(dataset.intensity(2, 2), None);
    assert_eq!(dataset.intensity(2, 1), Some(6.0));
    assert_eq!(dataset.mz(7, 0), None);
    assert_eq!(dataset.row_mz(2), &[100.2, 101.2]);
    assert_eq!(dataset.row_intensity(0), &[10.0, 20.0, 30.0]);
}

#[test]
fn test_padded_rows_carry_sentinels() {
    let dataset = three_scan_run();
    let row = dataset.padded_mz_row(2);
    assert_eq!(row.len(), 4);
    assert!(row[2].is_nan() && row[3].is_nan());
    assert_eq!(dataset.padded_intensity_row(2), &[5.0, 6.0, 0.0, 0.0]);
    assert_eq!(dataset.sentinel_starts(), vec![(0, 3), (2, 2)]);
}

#[test]
fn test_no_full_scan_is_fatal() {
    let arrays = PaddedArrays {
        scan_count: 2,
        width: 2,
        mz: vec![1.0, f64::NAN, f64::NAN, f64::NAN],
        intensity: vec![1.0, 0.0, 0.0, 0.0],
    };
    // width 2 but no row has two peaks
    let err = RunDataset::from_padded(arrays, metadata(vec![0.0, 1.0])).unwrap_err();
    assert_eq!(err, DatasetError::NoReferenceRow { scans: 2 });
}

#[test]
fn test_empty_run_has_no_reference_row() {
    let err = RunDatasetBuilder::new(SpectrumKind::Discrete)
        .build()
        .unwrap_err();
    assert!(matches!(err, DatasetError::NoReferenceRow { scans: 0 }));
}

#[test]
fn test_shape_mismatch() {
    let arrays = PaddedArrays {
        scan_count: 2,
        width: 2,
        mz: vec![1.0, 2.0, 1.0, 2.0],
        intensity: vec![1.0, 2.0, 3.0],
    };
    let err = RunDataset::from_padded(arrays, metadata(vec![0.0, 1.0])).unwrap_err();
    assert!(matches!(
        err,
        DatasetError::ShapeMismatch {
            array: "intensity",
            actual: 3,
            ..
        }
    ));
}

#[test]
fn test_peak_list_length_mismatch() {
    let err = RunDatasetBuilder::new(SpectrumKind::Discrete)
        .add_scan(0.0, vec![1.0, 2.0], vec![1.0])
        .build()
        .unwrap_err();
    assert!(matches!(err, DatasetError::PeakArrayMismatch { scan: 0, .. }));
}

#[test]
fn test_rt_must_not_decrease() {
    let err = RunDatasetBuilder::new(SpectrumKind::Discrete)
        .add_scan(1.0, vec![1.0], vec![1.0])
        .add_scan(0.5, vec![1.0], vec![1.0])
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        DatasetError::RetentionTimeNotMonotonic { index: 1, .. }
    ));

    // equal RT values are allowed
    let ok = RunDatasetBuilder::new(SpectrumKind::Discrete)
        .add_scan(1.0, vec![1.0], vec![1.0])
        .add_scan(1.0, vec![1.0], vec![1.0])
        .build();
    assert!(ok.is_ok());
}

#[test]
fn test_rt_must_be_finite() {
    let err = RunDatasetBuilder::new(SpectrumKind::Discrete)
        .add_scan(f64::NAN, vec![1.0], vec![1.0])
        .build()
        .unwrap_err();
    assert_eq!(err, DatasetError::NonFiniteRetentionTime { index: 0 });
}

#[test]
fn test_unsorted_row_rejected() {
    let err = RunDatasetBuilder::new(SpectrumKind::Discrete)
        .add_scan(0.0, vec![2.0, 1.0], vec![1.0, 1.0])
        .build()
        .unwrap_err();
    assert_eq!(err, DatasetError::UnsortedRow { row: 0, col: 1 });
}

#[test]
fn test_padding_must_be_trailing() {
    let arrays = PaddedArrays {
        scan_count: 2,
        width: 3,
        mz: vec![1.0, 2.0, 3.0, 1.0, f64::NAN, 3.0],
        intensity: vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0],
    };
    let err = RunDataset::from_padded(arrays, metadata(vec![0.0, 1.0])).unwrap_err();
    assert_eq!(err, DatasetError::PaddingNotTrailing { row: 1, col: 2 });
}

#[test]
fn test_padded_intensity_must_be_zero() {
    let arrays = PaddedArrays {
        scan_count: 2,
        width: 2,
        mz: vec![1.0, 2.0, 1.0, f64::NAN],
        intensity: vec![1.0, 1.0, 1.0, 5.0],
    };
    let err = RunDataset::from_padded(arrays, metadata(vec![0.0, 1.0])).unwrap_err();
    assert_eq!(err, DatasetError::NonZeroPaddingIntensity { row: 1, col: 1 });
}

// ==================== Metadata ====================

#[test]
fn test_settings_labels() {
    let settings = positive_tof_settings();
    assert_eq!(settings.short_label(), "ESI+ TOF SCAN");
    assert_eq!(settings.full_label(), "EsiPositive TimeOfFlight Scan");
    assert_eq!(settings.polarity(), Some("Positive"));
    assert_eq!(ScanSettings::default().short_label(), "");
}

#[test]
fn test_spectrum_kind_parse() {
    assert_eq!("Discrete".parse::<SpectrumKind>(), Ok(SpectrumKind::Discrete));
    assert_eq!(SpectrumKind::Continuous.to_string(), "continuous");
    assert!("stick".parse::<SpectrumKind>().is_err());
}

#[test]
fn test_summary_display() {
    let summary = three_scan_run().summary();
    assert_eq!(summary.total_peaks, 9);
    assert_eq!(summary.rt_range, Some((0.0, 2.0)));
    let text = summary.to_string();
    assert!(text.contains("3 scans x 4 columns"));
    assert!(text.contains("ESI+ TOF SCAN"));
}

#[test]
fn test_scans_round_trip_through_builder() {
    let dataset = three_scan_run();
    let mut builder = RunDatasetBuilder::new(dataset.spectrum_kind());
    for scan in dataset.scans() {
        builder.push_scan(scan);
    }
    let rebuilt = builder.build().unwrap();
    assert_eq!(rebuilt.peak_counts(), dataset.peak_counts());
    assert_eq!(rebuilt.row_mz(1), dataset.row_mz(1));
}
