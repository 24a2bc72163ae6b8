use std::collections::HashMap;

use super::*;
use crate::chemistry::NaturalAbundanceProvider;
use crate::dataset::{RunDatasetBuilder, Scan, SpectrumKind};
use crate::extract::{ExtractionMode, Extractor};

/// Provider returning canned distributions per formula
#[derive(Default)]
struct FixedProvider {
    entries: HashMap<String, (MassDistribution, i32)>,
}

impl FixedProvider {
    fn with(mut self, formula: &str, masses: &[f64], abundances: &[f64], charge: i32) -> Self {
        let dist = MassDistribution {
            masses: masses.to_vec(),
            abundances: abundances.to_vec(),
            mass_numbers: (0..masses.len() as u32).collect(),
        };
        self.entries.insert(formula.to_string(), (dist, charge));
        self
    }

    fn lookup(&self, formula: &str) -> Result<&(MassDistribution, i32), EnvelopeError> {
        self.entries.get(formula).ok_or_else(|| EnvelopeError::Provider {
            formula: formula.to_string(),
            message: "not in fixture".to_string(),
        })
    }
}

impl EnvelopeProvider for FixedProvider {
    fn mass_distribution(&self, formula: &str, _: f64, _: bool) -> Result<MassDistribution, EnvelopeError> {
        Ok(self.lookup(formula)?.0.clone())
    }

    fn net_charge(&self, formula: &str) -> Result<i32, EnvelopeError> {
        Ok(self.lookup(formula)?.1)
    }
}

fn gaussian(x: f64, center: f64, height: f64) -> f64 {
    let sigma = 0.05;
    height * (-(x - center).powi(2) / (2.0 * sigma * sigma)).exp()
}

/// Three identical profile scans with a monoisotopic peak at 100.5 and
/// its M+1 at 101.5 with half the height
fn envelope_run() -> RunDataset {
    let mut builder = RunDatasetBuilder::new(SpectrumKind::Continuous);
    for row in 0..3 {
        let mz: Vec<f64> = (0..41).map(|k| 100.0 + k as f64 * 0.05).collect();
        let intensity = mz
            .iter()
            .map(|&m| gaussian(m, 100.5, 100.0) + gaussian(m, 101.5, 50.0))
            .collect();
        builder.push_scan(Scan::new(row as f64, mz, intensity));
    }
    builder.build().unwrap()
}

fn envelope_provider() -> FixedProvider {
    FixedProvider::default().with("X+", &[100.5, 101.5], &[0.8, 0.4], 1)
}

// ==================== Core subtraction ====================

#[test]
fn test_self_cancellation() {
    let mz = [100.0, 100.1, 100.2, 101.0, 101.1, 101.2];
    let mut intensity = [1.0, 5.0, 1.0, 1.0, 5.0, 1.0];
    let envelope = IsotopeEnvelope::new(vec![100.1, 101.1], vec![1.0, 1.0]).unwrap();

    let removed = subtract_envelope(&mz, &mut intensity, &envelope);

    // band 1 loses the baselined reference profile [0, 4, 0]
    let expected = [1.0, 5.0, 1.0, 1.0, 1.0, 1.0];
    for (got, want) in intensity.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "{intensity:?}");
    }
    assert!((removed[4] - 4.0).abs() < 1e-9);
    assert_eq!(removed[0], 0.0);
}

#[test]
fn test_subtraction_clamps_at_zero() {
    let mz = [10.0, 10.5, 11.0, 11.5];
    let mut intensity = [0.0, 10.0, 0.0, 1.0];
    let envelope = IsotopeEnvelope::new(vec![10.5, 11.5], vec![1.0, 1.0]).unwrap();
    let removed = subtract_envelope(&mz, &mut intensity, &envelope);
    assert_eq!(intensity, [0.0, 10.0, 0.0, 0.0]);
    assert_eq!(removed, vec![0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_empty_reference_band_is_noop() {
    let mz = [101.0, 101.1];
    let mut intensity = [3.0, 4.0];
    let envelope = IsotopeEnvelope::new(vec![100.0, 101.0], vec![1.0, 1.0]).unwrap();
    let removed = subtract_envelope(&mz, &mut intensity, &envelope);
    assert_eq!(intensity, [3.0, 4.0]);
    assert_eq!(removed, vec![0.0, 0.0]);
}

#[test]
fn test_last_band_runs_to_slice_end() {
    let mz = [1.0, 1.25, 2.0, 3.0, 3.125, 3.25];
    let mut intensity = [0.0, 2.0, 0.0, 0.0, 0.0, 1.0];
    let envelope = IsotopeEnvelope::new(vec![1.25, 2.25, 3.25], vec![1.0, 0.1, 0.5]).unwrap();

    let removed = subtract_envelope(&mz, &mut intensity, &envelope);

    // the final position belongs to the last isotope's band
    assert_eq!(intensity, [0.0, 2.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(removed, vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
}

// ==================== Envelopes ====================

#[test]
fn test_envelope_normalizes_and_divides_by_charge() {
    let provider = FixedProvider::default().with(
        "Y-2",
        &[200.0, 201.0, 202.0, 203.0, 204.0, 205.0, 206.0],
        &[0.5, 0.25, 0.1, 0.05, 0.02, 0.01, 0.005],
        -2,
    );
    let envelope = IsotopeEnvelope::resolve(&provider, "Y-2").unwrap();
    assert_eq!(envelope.len(), MAX_ISOTOPES);
    assert_eq!(envelope.mz(), &[100.0, 100.5, 101.0, 101.5, 102.0]);
    assert_eq!(envelope.abundance()[0], 1.0);
    assert_eq!(envelope.abundance()[1], 0.5);
    assert_eq!(envelope.formula(), "Y-2");
}

#[test]
fn test_envelope_errors() {
    let provider = FixedProvider::default()
        .with("Neutral", &[100.0], &[1.0], 0)
        .with("Empty+", &[], &[], 1);
    assert!(matches!(
        IsotopeEnvelope::resolve(&provider, "Neutral"),
        Err(DeisotopeError::ZeroCharge { .. })
    ));
    assert!(matches!(
        IsotopeEnvelope::resolve(&provider, "Empty+"),
        Err(DeisotopeError::EmptyDistribution { .. })
    ));
    assert!(matches!(
        IsotopeEnvelope::resolve(&provider, "Missing+"),
        Err(DeisotopeError::Envelope { .. })
    ));
    assert!(IsotopeEnvelope::new(vec![2.0, 1.0], vec![1.0, 1.0]).is_err());
    assert!(IsotopeEnvelope::new(vec![1.0], vec![0.0]).is_err());
}

#[test]
fn test_natural_abundance_envelope() {
    let envelope = IsotopeEnvelope::resolve(&NaturalAbundanceProvider::new(), "C6H12O6Na+").unwrap();
    assert_eq!(envelope.len(), MAX_ISOTOPES);
    assert!((envelope.monoisotopic_mz() - 203.0532).abs() < 1e-3);
    // M+1 of a C6 compound is a few percent of M
    assert!(envelope.abundance()[1] > 0.05 && envelope.abundance()[1] < 0.1);
}

#[test]
fn test_targets_resolved_in_mass_order() {
    let provider = FixedProvider::default()
        .with("Heavy+", &[300.0, 301.0], &[1.0, 0.2], 1)
        .with("Light+", &[150.0, 151.0], &[1.0, 0.1], 1);
    let subtractor = IsotopeSubtractor::new(provider);
    let resolved = subtractor
        .resolve(&[
            DeisotopeTarget::new("Heavy+", 1.0, 0.5, 0.1),
            DeisotopeTarget::new("Light+", 1.0, 0.5, 0.1),
        ])
        .unwrap();
    assert_eq!(resolved[0].0.formula, "Light+");
    assert_eq!(resolved[1].0.formula, "Heavy+");
}

#[test]
fn test_mixed_charges_ordered_by_mass_not_mz() {
    // A2+ sits at m/z 200 but is the heavier compound
    let provider = FixedProvider::default()
        .with("A2+", &[400.0, 401.0], &[1.0, 0.3], 2)
        .with("B+", &[300.0, 301.0], &[1.0, 0.2], 1);
    let subtractor = IsotopeSubtractor::new(provider);
    let resolved = subtractor
        .resolve(&[
            DeisotopeTarget::new("A2+", 1.0, 0.5, 0.1),
            DeisotopeTarget::new("B+", 1.0, 0.5, 0.1),
        ])
        .unwrap();
    let order: Vec<&str> = resolved.iter().map(|(t, _)| t.formula.as_str()).collect();
    assert_eq!(order, ["B+", "A2+"]);
    assert_eq!(resolved[1].1.monoisotopic_mass(), 400.0);
    assert_eq!(resolved[1].1.monoisotopic_mz(), 200.0);
}

#[test]
fn test_invalid_target_rejected() {
    let subtractor = IsotopeSubtractor::new(envelope_provider());
    let err = subtractor
        .resolve(&[DeisotopeTarget::new("X+", 1.0, -0.5, 0.1)])
        .unwrap_err();
    assert!(matches!(err, DeisotopeError::InvalidTarget { .. }));
}

// ==================== Dataset subtraction ====================

#[test]
fn test_apply_removes_isotope_peak() {
    let mut dataset = envelope_run();
    let subtractor = IsotopeSubtractor::new(envelope_provider());
    let report = subtractor
        .apply(&mut dataset, &[DeisotopeTarget::new("X+", 1.0, 1.5, 0.3)])
        .unwrap();
    assert_eq!(report.targets_applied, 1);
    assert_eq!(report.scans_touched, 3);
    assert_eq!(report.restored_entries, 0);
    assert!(report.intensity_removed > 0.0);

    let extraction = Extractor::new(&dataset).chromatogram(101.4, 101.6, ExtractionMode::Exact);
    for value in extraction.current.values_or_zero() {
        assert!(value < 0.01, "isotope peak left: {value}");
    }
    let before = extraction.before_subtraction.unwrap();
    let original = Extractor::new(&envelope_run())
        .chromatogram(101.4, 101.6, ExtractionMode::Exact)
        .current;
    for (b, o) in before.values_or_zero().iter().zip(original.values_or_zero()) {
        assert!((b - o).abs() < 1e-9);
    }

    // monoisotopic peak is untouched
    let mono = Extractor::new(&dataset).chromatogram(100.44, 100.56, ExtractionMode::Exact);
    assert!(mono.current.values_or_zero()[0] > 200.0);
}

#[test]
fn test_overlay_conserves_signal() {
    let mut dataset = envelope_run();
    let original = envelope_run();
    IsotopeSubtractor::new(envelope_provider())
        .apply(&mut dataset, &[DeisotopeTarget::new("X+", 1.0, 1.5, 0.3)])
        .unwrap();

    for (row, record) in dataset.overlay().records() {
        for entry in record.entries() {
            let current = dataset.intensity(row, entry.column).unwrap();
            let before = original.intensity(row, entry.column).unwrap();
            assert!((current + entry.removed - before).abs() < 1e-9);
            assert_eq!(entry.original, before);
        }
    }
}

#[test]
fn test_reapply_restores_first() {
    let target = DeisotopeTarget::new("X+", 1.0, 1.5, 0.3);
    let subtractor = IsotopeSubtractor::new(envelope_provider());

    let mut once = envelope_run();
    subtractor.apply(&mut once, &[target.clone()]).unwrap();

    let mut twice = envelope_run();
    subtractor.apply(&mut twice, &[target.clone()]).unwrap();
    let report = subtractor.apply(&mut twice, &[target]).unwrap();
    assert!(report.restored_entries > 0);

    for row in 0..once.scan_count() {
        assert_eq!(once.row_intensity(row), twice.row_intensity(row));
    }
}

#[test]
fn test_clear_restores_original() {
    let mut dataset = envelope_run();
    let subtractor = IsotopeSubtractor::new(envelope_provider());
    subtractor
        .apply(&mut dataset, &[DeisotopeTarget::new("X+", 1.0, 0.2, 0.3)])
        .unwrap();
    // only the scan at RT 1 lies in (0.8, 1.2]
    assert_eq!(dataset.overlay().touched_scans(), 1);

    let restored = subtractor.clear(&mut dataset);
    assert!(restored > 0);
    assert!(dataset.overlay().is_empty());
    let original = envelope_run();
    for row in 0..3 {
        assert_eq!(dataset.row_intensity(row), original.row_intensity(row));
    }
    assert_eq!(subtractor.clear(&mut dataset), 0);
}

#[test]
fn test_failed_resolution_leaves_dataset_untouched() {
    let mut dataset = envelope_run();
    let subtractor = IsotopeSubtractor::new(envelope_provider());
    subtractor
        .apply(&mut dataset, &[DeisotopeTarget::new("X+", 1.0, 1.5, 0.3)])
        .unwrap();
    let snapshot: Vec<Vec<f64>> = (0..3).map(|r| dataset.row_intensity(r).to_vec()).collect();

    let err = subtractor.apply(
        &mut dataset,
        &[
            DeisotopeTarget::new("X+", 1.0, 1.5, 0.3),
            DeisotopeTarget::new("Unknown+", 1.0, 1.5, 0.3),
        ],
    );
    assert!(err.is_err());
    assert_eq!(dataset.overlay().touched_scans(), 3);
    for (row, expected) in snapshot.iter().enumerate() {
        assert_eq!(dataset.row_intensity(row), expected.as_slice());
    }
}
