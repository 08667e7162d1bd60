//! Error types for the mmc-distribution crate.

use mmc_field::{Dim, ErrorKind, FieldError};

/// Error type for all fallible operations in the mmc-distribution crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DistributionError {
    /// Returned when the bin edges are unusable.
    #[error("invalid bin edges: {reason}")]
    InvalidEdges {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when locations are requested along a non-horizontal dimension.
    #[error("locations must be taken along y or x, got '{dim}'")]
    InvalidLocationDim {
        /// The offending dimension.
        dim: Dim,
    },

    /// Wrapped error from the field crate.
    #[error(transparent)]
    Field(#[from] FieldError),
}

impl DistributionError {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Field(e) => e.kind(),
            Self::InvalidEdges { .. } | Self::InvalidLocationDim { .. } => {
                ErrorKind::Configuration
            }
        }
    }
}
