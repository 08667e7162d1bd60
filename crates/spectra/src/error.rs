//! Error types for the mmc-spectra crate.

use mmc_field::{Dim, ErrorKind, FieldError};

/// Error type for all fallible operations in the mmc-spectra crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpectraError {
    /// Returned when a dimension cannot play the requested role.
    #[error("dimension '{dim}' cannot be used as {role}")]
    InvalidDimension {
        /// The offending dimension.
        dim: Dim,
        /// Role it was requested for.
        role: &'static str,
    },

    /// Returned when the spectral and averaging dimensions coincide.
    #[error("spectral and averaging dimension are both '{dim}'")]
    SameDimension {
        /// The repeated dimension.
        dim: Dim,
    },

    /// Returned when a window, detrend or scaling name is not recognised.
    #[error("unknown {what}: {name:?}")]
    UnknownName {
        /// What kind of name was looked up.
        what: &'static str,
        /// The name that was looked up.
        name: String,
    },

    /// Returned when segment length or overlap are unusable.
    #[error("invalid segmentation: {reason}")]
    InvalidSegment {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a series is too short.
    #[error("series of length {n} is too short, need at least {min}")]
    TooShort {
        /// Length supplied.
        n: usize,
        /// Minimum required.
        min: usize,
    },

    /// Returned when paired series differ in length.
    #[error("length mismatch: {left} vs {right} samples")]
    LengthMismatch {
        /// Length of the first series.
        left: usize,
        /// Length of the second series.
        right: usize,
    },

    /// Returned when a confidence level lies outside (0, 1).
    #[error("confidence level must be in (0, 1), got {p}")]
    InvalidConfidence {
        /// The offending level.
        p: f64,
    },

    /// Returned when a chi-squared distribution cannot be constructed.
    #[error("chi-squared distribution with {dof} degrees of freedom: {message}")]
    ChiSquared {
        /// Degrees of freedom.
        dof: f64,
        /// Description of the failure.
        message: String,
    },

    /// Wrapped error from the field crate.
    #[error(transparent)]
    Field(#[from] FieldError),
}

impl SpectraError {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Field(e) => e.kind(),
            Self::TooShort { .. } | Self::LengthMismatch { .. } => ErrorKind::StructuralMismatch,
            Self::InvalidDimension { .. }
            | Self::SameDimension { .. }
            | Self::UnknownName { .. }
            | Self::InvalidSegment { .. }
            | Self::InvalidConfidence { .. }
            | Self::ChiSquared { .. } => ErrorKind::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_dimension() {
        let err = SpectraError::InvalidDimension {
            dim: Dim::Height,
            role: "spectral dimension",
        };
        assert_eq!(
            err.to_string(),
            "dimension 'height' cannot be used as spectral dimension"
        );
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn error_wraps_field_kind() {
        let err: SpectraError = FieldError::NonUniformSpacing { dim: Dim::Time }.into();
        assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
        let err: SpectraError = FieldError::MissingAttribute { key: "DX".into() }.into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<SpectraError>();
    }
}
