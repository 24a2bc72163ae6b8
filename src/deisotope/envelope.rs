use super::{DeisotopeError, EnvelopeProvider};

/// Leading isotopes kept per envelope
pub const MAX_ISOTOPES: usize = 5;

/// Abundance below which provider entries are dropped
pub const ABUNDANCE_THRESHOLD: f64 = 1e-9;

/// Expected isotope peaks of one ion: ascending m/z with abundances
/// relative to the first (monoisotopic) peak.
#[derive(Debug, Clone, PartialEq)]
pub struct IsotopeEnvelope {
    formula: String,
    monoisotopic_mass: f64,
    mz: Vec<f64>,
    abundance: Vec<f64>,
}

impl IsotopeEnvelope {
    /// Build an envelope from explicit peaks; abundances are normalized to
    /// the first entry. The peaks are taken as singly charged.
    pub fn new(mz: Vec<f64>, abundance: Vec<f64>) -> Result<Self, DeisotopeError> {
        Self::checked(String::new(), mz, abundance)
    }

    fn checked(formula: String, mz: Vec<f64>, abundance: Vec<f64>) -> Result<Self, DeisotopeError> {
        let invalid = |reason: &str| DeisotopeError::InvalidEnvelope {
            formula: formula.clone(),
            reason: reason.to_string(),
        };
        if mz.is_empty() {
            return Err(invalid("no isotopes"));
        }
        if mz.len() != abundance.len() {
            return Err(invalid("mass and abundance counts differ"));
        }
        if mz.iter().chain(&abundance).any(|v| !v.is_finite()) {
            return Err(invalid("non-finite value"));
        }
        if mz.windows(2).any(|w| w[1] < w[0]) {
            return Err(invalid("masses not ascending"));
        }
        let first = abundance[0];
        if first <= 0.0 {
            return Err(invalid("first abundance must be positive"));
        }
        let abundance = abundance.into_iter().map(|a| a / first).collect();
        Ok(Self {
            formula,
            monoisotopic_mass: mz[0],
            mz,
            abundance,
        })
    }

    /// Resolve a charged formula through a provider.
    ///
    /// The distribution is grouped by mass number, truncated to
    /// [`MAX_ISOTOPES`] and divided by the absolute net charge.
    pub fn resolve<P: EnvelopeProvider + ?Sized>(provider: &P, formula: &str) -> Result<Self, DeisotopeError> {
        let wrap = |source| DeisotopeError::Envelope {
            formula: formula.to_string(),
            source,
        };
        let charge = provider.net_charge(formula).map_err(wrap)?.unsigned_abs();
        if charge == 0 {
            return Err(DeisotopeError::ZeroCharge {
                formula: formula.to_string(),
            });
        }
        let dist = provider
            .mass_distribution(formula, ABUNDANCE_THRESHOLD, true)
            .map_err(wrap)?;
        if dist.is_empty() {
            return Err(DeisotopeError::EmptyDistribution {
                formula: formula.to_string(),
            });
        }
        let n = dist.masses.len().min(MAX_ISOTOPES);
        let mz = dist.masses[..n].iter().map(|m| m / charge as f64).collect();
        let abundance = dist.abundances.iter().take(n).copied().collect();
        let mut envelope = Self::checked(formula.to_string(), mz, abundance)?;
        envelope.monoisotopic_mass = dist.masses[0];
        Ok(envelope)
    }

    /// Formula the envelope was resolved from (empty when built by hand)
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Isotope m/z values, ascending
    pub fn mz(&self) -> &[f64] {
        &self.mz
    }

    /// Abundances relative to the first isotope
    pub fn abundance(&self) -> &[f64] {
        &self.abundance
    }

    /// Number of isotopes
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    /// Always false for a constructed envelope
    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Monoisotopic mass before division by charge
    pub fn monoisotopic_mass(&self) -> f64 {
        self.monoisotopic_mass
    }

    /// m/z of the monoisotopic peak
    pub fn monoisotopic_mz(&self) -> f64 {
        self.mz[0]
    }

    /// m/z of the heaviest kept isotope
    pub fn last_mz(&self) -> f64 {
        self.mz[self.mz.len() - 1]
    }
}
