use std::collections::BTreeMap;

use super::elements::{self, Isotope};
use super::{Formula, FormulaError};
use crate::deisotope::MassDistribution;

/// Masses closer than this are one peak when not grouping by mass number
const MASS_TOLERANCE: f64 = 1e-6;

/// (mass, abundance, mass number)
type Peak = (f64, f64, u32);

/// Isotope distribution of a formula.
///
/// Each element's isotope list is raised to its atom count by repeated
/// convolution, then the element distributions are convolved together.
/// Entries with abundance at or below `threshold` are pruned after every
/// step. With `group_by_mass_number`, entries sharing a nucleon count are
/// merged into one peak at their abundance-weighted mean mass. Charge
/// tokens are massless and ignored.
pub fn mass_distribution(
    formula: &Formula,
    threshold: f64,
    group_by_mass_number: bool,
) -> Result<MassDistribution, FormulaError> {
    let mut combined: Option<Vec<Peak>> = None;
    for (symbol, count) in formula.elements() {
        let isotopes = elements::isotopes(symbol).ok_or_else(|| FormulaError::UnknownElement {
            symbol: symbol.to_string(),
        })?;
        let element = convolve_pow(isotopes, count, threshold, group_by_mass_number);
        combined = Some(match combined {
            None => element,
            Some(acc) => convolve(&acc, &element, threshold, group_by_mass_number),
        });
    }

    let mut peaks = combined.unwrap_or_default();
    peaks.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(MassDistribution {
        masses: peaks.iter().map(|p| p.0).collect(),
        abundances: peaks.iter().map(|p| p.1).collect(),
        mass_numbers: peaks.iter().map(|p| p.2).collect(),
    })
}

fn convolve_pow(isotopes: &[Isotope], n: u32, threshold: f64, group: bool) -> Vec<Peak> {
    let mut base: Vec<Peak> = isotopes
        .iter()
        .map(|i| (i.mass, i.abundance, i.mass_number))
        .collect();
    let mut result: Vec<Peak> = vec![(0.0, 1.0, 0)];
    let mut n = n;
    while n > 0 {
        if n & 1 == 1 {
            result = convolve(&result, &base, threshold, group);
        }
        n >>= 1;
        if n > 0 {
            base = convolve(&base, &base, threshold, group);
        }
    }
    result
}

fn convolve(a: &[Peak], b: &[Peak], threshold: f64, group: bool) -> Vec<Peak> {
    let products = a.iter().flat_map(|&(ma, aa, na)| {
        b.iter()
            .map(move |&(mb, ab, nb)| (ma + mb, aa * ab, na + nb))
    });
    let merged = if group {
        merge_by_mass_number(products)
    } else {
        merge_by_mass(products)
    };
    merged.into_iter().filter(|p| p.1 > threshold).collect()
}

fn merge_by_mass_number(peaks: impl Iterator<Item = Peak>) -> Vec<Peak> {
    // mass number -> (abundance, abundance-weighted mass)
    let mut groups: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
    for (mass, abundance, number) in peaks {
        let slot = groups.entry(number).or_insert((0.0, 0.0));
        slot.0 += abundance;
        slot.1 += mass * abundance;
    }
    groups
        .into_iter()
        .filter(|(_, (abundance, _))| *abundance > 0.0)
        .map(|(number, (abundance, weighted))| (weighted / abundance, abundance, number))
        .collect()
}

fn merge_by_mass(peaks: impl Iterator<Item = Peak>) -> Vec<Peak> {
    let mut sorted: Vec<Peak> = peaks.collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<Peak> = Vec::with_capacity(sorted.len());
    for (mass, abundance, number) in sorted {
        match merged.last_mut() {
            Some(last) if (mass - last.0).abs() < MASS_TOLERANCE => {
                let total = last.1 + abundance;
                if total > 0.0 {
                    last.0 = (last.0 * last.1 + mass * abundance) / total;
                }
                last.1 = total;
            }
            _ => merged.push((mass, abundance, number)),
        }
    }
    merged
}
