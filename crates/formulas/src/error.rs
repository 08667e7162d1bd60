//! Error types for the mmc-formulas crate.

/// Error type for all fallible operations in the mmc-formulas crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FormulaError {
    /// Returned when a saturation vapour pressure model name is not recognised.
    #[error("unknown saturation vapour pressure model: {name:?}")]
    UnknownModel {
        /// The name that was looked up.
        name: String,
    },

    /// Returned when paired inputs differ in length.
    #[error("length mismatch: {left} vs {right} elements")]
    LengthMismatch {
        /// Length of the first input.
        left: usize,
        /// Length of the second input.
        right: usize,
    },

    /// Returned when too few usable values remain for a computation.
    #[error("insufficient data: got {n} usable values, need at least {min}")]
    InsufficientData {
        /// Number of usable values.
        n: usize,
        /// Minimum required.
        min: usize,
    },

    /// Returned when grid arrays do not line up.
    #[error("grid shape mismatch: {reason}")]
    GridMismatch {
        /// Description of the mismatch.
        reason: String,
    },
}
