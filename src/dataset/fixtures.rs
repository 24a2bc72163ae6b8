//! Small hand-checkable runs shared by unit tests across modules.

use super::{InstrumentInfo, RtUnit, RunDataset, RunDatasetBuilder, ScanSettings, SpectrumKind};

/// Three scans at RT 0, 1, 2 over four columns; only scan 1 is full.
///
/// ```text
/// scan 0: 100.0 101.0 102.0  -      | 10 20 30
/// scan 1: 100.1 101.1 102.1 103.1   |  1  2  3  4
/// scan 2: 100.2 101.2  -     -      |  5  6
/// ```
pub(crate) fn three_scan_run() -> RunDataset {
    RunDatasetBuilder::new(SpectrumKind::Continuous)
        .settings(positive_tof_settings())
        .add_scan(0.0, vec![100.0, 101.0, 102.0], vec![10.0, 20.0, 30.0])
        .add_scan(1.0, vec![100.1, 101.1, 102.1, 103.1], vec![1.0, 2.0, 3.0, 4.0])
        .add_scan(2.0, vec![100.2, 101.2], vec![5.0, 6.0])
        .build()
        .expect("fixture is valid")
}

/// Every scan shares the same m/z grid `start + k * step`.
pub(crate) fn aligned_run(scans: usize, width: usize, start: f64, step: f64) -> RunDataset {
    let mut builder = RunDatasetBuilder::new(SpectrumKind::Continuous).rt_unit(RtUnit::Minutes);
    for row in 0..scans {
        let mz: Vec<f64> = (0..width).map(|k| start + k as f64 * step).collect();
        let intensity: Vec<f64> = (0..width)
            .map(|k| ((row * 7 + k * 3) % 11) as f64 + 1.0)
            .collect();
        builder.push_scan(super::Scan::new(row as f64 * 0.5, mz, intensity));
    }
    builder.build().expect("fixture is valid")
}

/// Like [`aligned_run`] but each scan's grid is shifted by a small,
/// row-dependent jitter below half a step.
pub(crate) fn jittered_run(scans: usize, width: usize, start: f64, step: f64) -> RunDataset {
    let mut builder = RunDatasetBuilder::new(SpectrumKind::Continuous);
    for row in 0..scans {
        let jitter = ((row % 5) as f64 - 2.0) * step * 0.1;
        let mz: Vec<f64> = (0..width)
            .map(|k| start + k as f64 * step + jitter)
            .collect();
        let intensity: Vec<f64> = (0..width).map(|k| (row + k) as f64 + 1.0).collect();
        builder.push_scan(super::Scan::new(row as f64, mz, intensity));
    }
    builder.build().expect("fixture is valid")
}

pub(crate) fn positive_tof_settings() -> ScanSettings {
    ScanSettings::new(InstrumentInfo::new("Esi", "TimeOfFlight"))
        .with_entry("Polarity", "Positive")
        .with_entry("ScanMode", "Scan")
}
