use crate::chemistry::FormulaError;

/// Failure reported by an [`EnvelopeProvider`](super::EnvelopeProvider)
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvelopeError {
    /// Formula could not be parsed or contains unknown elements
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// Provider-specific failure
    #[error("isotope provider failed for {formula:?}: {message}")]
    Provider {
        /// Formula being resolved
        formula: String,
        /// Provider message
        message: String,
    },
}

/// Errors resolving targets or applying isotope subtraction.
///
/// All of them are raised before the dataset is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeisotopeError {
    /// The provider could not resolve a formula
    #[error("cannot resolve isotope envelope of {formula:?}: {source}")]
    Envelope {
        /// Target formula
        formula: String,
        /// Provider failure
        #[source]
        source: EnvelopeError,
    },

    /// Formula carries no net charge, so it has no m/z
    #[error("formula {formula:?} has zero net charge; add + or - tokens")]
    ZeroCharge {
        /// Target formula
        formula: String,
    },

    /// Provider returned no isotopes above the abundance threshold
    #[error("formula {formula:?} has an empty isotope distribution")]
    EmptyDistribution {
        /// Target formula
        formula: String,
    },

    /// Envelope masses or abundances are unusable
    #[error("invalid isotope envelope for {formula:?}: {reason}")]
    InvalidEnvelope {
        /// Target formula (empty for hand-built envelopes)
        formula: String,
        /// What is wrong
        reason: String,
    },

    /// Target window is not finite or has a negative tolerance
    #[error("invalid target {formula:?}: {reason}")]
    InvalidTarget {
        /// Target formula
        formula: String,
        /// What is wrong
        reason: String,
    },
}
