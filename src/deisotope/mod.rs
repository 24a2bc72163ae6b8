//! # Isotope Subtraction
//!
//! Removes the heavier isotope peaks of known compounds from a run so that
//! co-eluting signals underneath become visible.
//!
//! Isotope envelopes come from an injected [`EnvelopeProvider`]; the crate
//! ships [`NaturalAbundanceProvider`](crate::chemistry::NaturalAbundanceProvider),
//! and tests can pass a double. [`IsotopeSubtractor::apply`] edits the
//! dataset's intensities in place and records the removed signal in the
//! dataset's [`Overlay`](crate::overlay::Overlay), so extraction can still
//! show the data as it was.
//!
//! Applying a new target list first restores the intensities from the
//! overlay; subtraction never stacks across calls.

mod envelope;
mod error;
mod subtract;

#[cfg(test)]
mod tests;

pub use envelope::{IsotopeEnvelope, ABUNDANCE_THRESHOLD, MAX_ISOTOPES};
pub use error::{DeisotopeError, EnvelopeError};
pub use subtract::subtract_envelope;

use serde::{Deserialize, Serialize};

use crate::dataset::RunDataset;
use crate::index::index_greater_than;

/// Isotope distribution returned by a provider, ascending by mass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MassDistribution {
    /// Masses (Da), ascending
    pub masses: Vec<f64>,
    /// Abundances, same length as `masses`
    pub abundances: Vec<f64>,
    /// Nucleon count of each entry
    pub mass_numbers: Vec<u32>,
}

impl MassDistribution {
    /// Whether the distribution holds no entries
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }
}

/// Source of isotope distributions for charged formulas
pub trait EnvelopeProvider {
    /// Isotope distribution of `formula`, omitting entries with abundance
    /// at or below `threshold`; with `group_by_mass_number` entries sharing
    /// a nucleon count are summed.
    fn mass_distribution(
        &self,
        formula: &str,
        threshold: f64,
        group_by_mass_number: bool,
    ) -> Result<MassDistribution, EnvelopeError>;

    /// Net charge carried by `formula`
    fn net_charge(&self, formula: &str) -> Result<i32, EnvelopeError>;
}

impl<P: EnvelopeProvider + ?Sized> EnvelopeProvider for &P {
    fn mass_distribution(
        &self,
        formula: &str,
        threshold: f64,
        group_by_mass_number: bool,
    ) -> Result<MassDistribution, EnvelopeError> {
        (**self).mass_distribution(formula, threshold, group_by_mass_number)
    }

    fn net_charge(&self, formula: &str) -> Result<i32, EnvelopeError> {
        (**self).net_charge(formula)
    }
}

/// Compound to subtract: charged formula plus search window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeisotopeTarget {
    /// Charged ion formula, e.g. `C6H12O6Na+`
    pub formula: String,
    /// Apex retention time
    pub rt: f64,
    /// Half-width of the RT window
    pub rt_tolerance: f64,
    /// m/z margin around the envelope
    pub mz_tolerance: f64,
}

impl DeisotopeTarget {
    /// Create a target
    pub fn new(formula: impl Into<String>, rt: f64, rt_tolerance: f64, mz_tolerance: f64) -> Self {
        Self {
            formula: formula.into(),
            rt,
            rt_tolerance,
            mz_tolerance,
        }
    }

    fn check(&self) -> Result<(), DeisotopeError> {
        let invalid = |reason: &str| DeisotopeError::InvalidTarget {
            formula: self.formula.clone(),
            reason: reason.to_string(),
        };
        if !self.rt.is_finite() {
            return Err(invalid("retention time is not finite"));
        }
        if !(self.rt_tolerance >= 0.0) || !self.rt_tolerance.is_finite() {
            return Err(invalid("RT tolerance must be finite and non-negative"));
        }
        if !(self.mz_tolerance >= 0.0) || !self.mz_tolerance.is_finite() {
            return Err(invalid("m/z tolerance must be finite and non-negative"));
        }
        Ok(())
    }
}

/// Outcome of one [`IsotopeSubtractor::apply`] call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeisotopeReport {
    /// Targets processed
    pub targets_applied: usize,
    /// Scans carrying subtraction records afterwards
    pub scans_touched: usize,
    /// Total intensity removed
    pub intensity_removed: f64,
    /// Entries restored from a previous subtraction before applying
    pub restored_entries: usize,
}

/// Isotope subtraction engine over an injected envelope provider
#[derive(Debug, Clone)]
pub struct IsotopeSubtractor<P> {
    provider: P,
}

impl<P: EnvelopeProvider> IsotopeSubtractor<P> {
    /// Create a subtractor using `provider` for isotope envelopes
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Provider in use
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve every target's envelope, in ascending monoisotopic mass
    pub fn resolve(&self, targets: &[DeisotopeTarget]) -> Result<Vec<(DeisotopeTarget, IsotopeEnvelope)>, DeisotopeError> {
        let mut resolved = targets
            .iter()
            .map(|target| {
                target.check()?;
                let envelope = IsotopeEnvelope::resolve(&self.provider, &target.formula)?;
                Ok((target.clone(), envelope))
            })
            .collect::<Result<Vec<_>, DeisotopeError>>()?;
        // stable: equal masses keep submission order
        resolved.sort_by(|a, b| a.1.monoisotopic_mass().total_cmp(&b.1.monoisotopic_mass()));
        Ok(resolved)
    }

    /// Replace any previous subtraction on `dataset` with `targets`.
    ///
    /// Lighter compounds are processed first so their corrections are
    /// visible to heavier ones with overlapping windows. Every target is
    /// resolved before the dataset is touched.
    pub fn apply(&self, dataset: &mut RunDataset, targets: &[DeisotopeTarget]) -> Result<DeisotopeReport, DeisotopeError> {
        let resolved = self.resolve(targets)?;
        Ok(self.apply_resolved(dataset, &resolved))
    }

    /// [`apply`](Self::apply) with targets already passed through
    /// [`resolve`](Self::resolve)
    pub(crate) fn apply_resolved(
        &self,
        dataset: &mut RunDataset,
        resolved: &[(DeisotopeTarget, IsotopeEnvelope)],
    ) -> DeisotopeReport {
        let restored_entries = restore(dataset);

        let mut intensity_removed = 0.0;
        for (target, envelope) in resolved {
            let removed = subtract_target(dataset, target, envelope);
            log::debug!(
                "Subtracted {} ({} isotopes from m/z {:.4}): removed {:.3}",
                target.formula,
                envelope.len(),
                envelope.monoisotopic_mz(),
                removed
            );
            intensity_removed += removed;
        }

        let report = DeisotopeReport {
            targets_applied: resolved.len(),
            scans_touched: dataset.overlay().touched_scans(),
            intensity_removed,
            restored_entries,
        };
        log::info!(
            "Isotope subtraction: {} targets, {} scans touched",
            report.targets_applied,
            report.scans_touched
        );
        report
    }

    /// Undo all subtraction on `dataset`; returns the restored entry count
    pub fn clear(&self, dataset: &mut RunDataset) -> usize {
        restore(dataset)
    }
}

/// Write every recorded original intensity back and drop the overlay
pub fn restore(dataset: &mut RunDataset) -> usize {
    let mut view = dataset.subtraction_view();
    if view.overlay.is_empty() {
        return 0;
    }
    let restored = view.overlay.restore_into(view.intensity, view.width);
    log::debug!("Restored {} intensities from the subtraction overlay", restored);
    restored
}

fn subtract_target(dataset: &mut RunDataset, target: &DeisotopeTarget, envelope: &IsotopeEnvelope) -> f64 {
    let mut view = dataset.subtraction_view();
    let rows = {
        let start = index_greater_than(target.rt - target.rt_tolerance, view.retention_time);
        let end = index_greater_than(target.rt + target.rt_tolerance, view.retention_time);
        start..end.max(start)
    };
    let mz_lo = envelope.monoisotopic_mz() - target.mz_tolerance;
    let mz_hi = envelope.last_mz() + target.mz_tolerance;

    let mut total = 0.0;
    for row in rows {
        let row_start = row * view.width;
        let populated = view.peak_counts[row];
        let mz_row = &view.mz[row_start..row_start + populated];
        let lo = index_greater_than(mz_lo, mz_row);
        let hi = index_greater_than(mz_hi, mz_row).max(lo);
        if lo == hi {
            continue;
        }
        let slice = &mut view.intensity[row_start + lo..row_start + hi];
        let original = slice.to_vec();
        let removed = subtract_envelope(&mz_row[lo..hi], slice, envelope);
        total += removed.iter().sum::<f64>();
        view.overlay.merge(
            row,
            view.retention_time[row],
            lo,
            &mz_row[lo..hi],
            &original,
            &removed,
        );
    }
    total
}
