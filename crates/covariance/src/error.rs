//! Error types for the mmc-covariance crate.

use mmc_field::ErrorKind;

/// Error type for all fallible operations in the mmc-covariance crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CovarianceError {
    /// Returned when an interval string cannot be parsed.
    #[error("invalid interval {text:?}: {reason}")]
    InvalidInterval {
        /// The string that was parsed.
        text: String,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when configuration options cannot be combined.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when the columns of a series differ in length.
    #[error("series columns differ in length: {times} timestamps, {other} entries")]
    LengthMismatch {
        /// Number of timestamps.
        times: usize,
        /// Length of the mismatched column.
        other: usize,
    },

    /// Returned when timestamps decrease.
    #[error("timestamps must be non-decreasing (at index {index})")]
    Unsorted {
        /// First index that is earlier than its predecessor.
        index: usize,
    },

    /// Returned when only one input carries a level index.
    #[error("both inputs must carry a level index, or neither")]
    LevelStructure,

    /// Returned when the inputs are not indexed identically.
    #[error("inputs are not aligned: {reason}")]
    IndexMismatch {
        /// Description of the difference.
        reason: String,
    },
}

impl CovarianceError {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInterval { .. } | Self::InvalidConfig { .. } => ErrorKind::Configuration,
            Self::LengthMismatch { .. }
            | Self::Unsorted { .. }
            | Self::LevelStructure
            | Self::IndexMismatch { .. } => ErrorKind::StructuralMismatch,
        }
    }
}
