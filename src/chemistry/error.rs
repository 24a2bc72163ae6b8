/// Errors parsing or evaluating a chemical formula
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormulaError {
    /// Characters outside the `Symbol[count]` grammar
    #[error("formula {formula:?}: unexpected {fragment:?}")]
    InvalidSyntax {
        /// Formula as given
        formula: String,
        /// First offending fragment
        fragment: String,
    },

    /// Atom count does not fit in 32 bits
    #[error("formula {formula:?}: count {count:?} out of range")]
    CountOverflow {
        /// Formula as given
        formula: String,
        /// Offending digits
        count: String,
    },

    /// Net charge does not fit in 32 bits
    #[error("net charge {net} out of range")]
    ChargeOverflow {
        /// Net charge as counted
        net: i64,
    },

    /// Element symbol missing from the isotope table
    #[error("unknown element {symbol:?}")]
    UnknownElement {
        /// Offending symbol
        symbol: String,
    },

    /// Subtraction would leave a negative atom count
    #[error("cannot remove {requested} {symbol} from a formula holding {available}")]
    NegativeCount {
        /// Element symbol
        symbol: String,
        /// Atoms present
        available: u32,
        /// Atoms to remove
        requested: u32,
    },

    /// Adduct notation not of the form `[M<+|-><group>...]<n><+|->`
    #[error("invalid adduct notation {0:?}")]
    InvalidAdduct(String),
}
