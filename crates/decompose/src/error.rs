//! Error types for the mmc-decompose crate.

use mmc_field::{ErrorKind, FieldError};
use mmc_smooth::SmoothError;

/// Error type for all fallible operations in the mmc-decompose crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecomposeError {
    /// Returned when a mean mode name is not recognised.
    #[error("unknown mean mode: {name:?} (expected \"static\" or \"smoothed\")")]
    UnknownMode {
        /// The name that was looked up.
        name: String,
    },

    /// Returned when the smoothing window does not fit the series.
    #[error("smoothing window of {window_size} points invalid for a series of length {len}")]
    InvalidWindow {
        /// Requested window size in points.
        window_size: usize,
        /// Length of the series along the mean dimension.
        len: usize,
    },

    /// Returned when the smoothing delta is negative or not finite.
    #[error("smoothing delta must be finite and non-negative, got {delta}")]
    InvalidDelta {
        /// The offending delta.
        delta: f64,
    },

    /// Wrapped error from the field crate.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Wrapped error from the smoother.
    #[error(transparent)]
    Smooth(#[from] SmoothError),
}

impl DecomposeError {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Field(e) => e.kind(),
            Self::UnknownMode { .. }
            | Self::InvalidWindow { .. }
            | Self::InvalidDelta { .. }
            | Self::Smooth(_) => ErrorKind::Configuration,
        }
    }
}
