//! # Chemistry
//!
//! Built-in isotope-envelope provider: a formula parser that understands
//! charge tokens and adduct notation, a natural-abundance isotope table and
//! a convolution-based mass distribution.
//!
//! ```rust
//! use rpd::chemistry::{Adduct, Formula, NaturalAbundanceProvider};
//! use rpd::deisotope::EnvelopeProvider;
//!
//! let glucose: Formula = "C6H12O6".parse()?;
//! let ion = Adduct::parse("[M+Na]+")?.apply(&glucose)?;
//! assert_eq!(ion.to_string(), "C6H12O6Na+");
//!
//! let provider = NaturalAbundanceProvider::new();
//! let dist = provider.mass_distribution(&ion.to_string(), 1e-9, true)?;
//! assert_eq!(dist.mass_numbers[0], 203);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod elements;
mod error;
mod formula;
mod isotope;


pub use elements::{isotopes, Isotope, SYMBOLS};
pub use error::FormulaError;
pub use formula::{Adduct, Formula};
pub use isotope::mass_distribution;

use crate::deisotope::{EnvelopeError, EnvelopeProvider, MassDistribution};

/// [`EnvelopeProvider`] backed by the built-in natural-abundance table
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalAbundanceProvider;

impl NaturalAbundanceProvider {
    /// Create the provider
    pub fn new() -> Self {
        Self
    }
}

impl EnvelopeProvider for NaturalAbundanceProvider {
    fn mass_distribution(
        &self,
        formula: &str,
        threshold: f64,
        group_by_mass_number: bool,
    ) -> Result<MassDistribution, EnvelopeError> {
        let parsed = Formula::parse(formula)?;
        Ok(mass_distribution(&parsed, threshold, group_by_mass_number)?)
    }

    fn net_charge(&self, formula: &str) -> Result<i32, EnvelopeError> {
        Ok(Formula::parse(formula)?.net_charge()?)
    }
}
