//! Error types for the mmc-field crate.

use crate::dim::Dim;

/// Broad category of a failure, shared by every mmc crate error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecognised mode or axis name, or an unsupported parameter combination.
    Configuration,
    /// A requested field or variable is absent from the input.
    MissingVariable,
    /// Inputs whose structure does not fit together (shape, index or spacing).
    StructuralMismatch,
}

/// Error type for all fallible operations in the mmc-field crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FieldError {
    /// Returned when a dimension name cannot be resolved.
    #[error("unknown dimension: {name:?}")]
    UnknownDimension {
        /// The name that was looked up.
        name: String,
    },

    /// Returned when an attribute required for a computation is absent.
    #[error("attribute '{key}' not found")]
    MissingAttribute {
        /// Attribute key.
        key: String,
    },

    /// Returned when a dimension has no notion of sample spacing.
    #[error("dimension '{dim}' has no sample spacing")]
    NoSpacing {
        /// The offending dimension.
        dim: Dim,
    },

    /// Returned when a variable is not present in a dataset.
    #[error("variable '{name}' not found")]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
    },

    /// Returned when the number of timestamps differs from the time axis length.
    #[error("{times} timestamps supplied for a time axis of length {len}")]
    TimeAxisMismatch {
        /// Number of timestamps supplied.
        times: usize,
        /// Length of the time axis.
        len: usize,
    },

    /// Returned when samples along a dimension are not equally spaced.
    #[error("samples along '{dim}' are not equally spaced")]
    NonUniformSpacing {
        /// The offending dimension.
        dim: Dim,
    },

    /// Returned when two arrays that must line up have incompatible shapes.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: [usize; 4],
        /// Actual shape.
        got: [usize; 4],
    },

    /// Returned when a dimension is too short for the requested computation.
    #[error("dimension '{dim}' has length {len}, need at least {min}")]
    InsufficientLength {
        /// The offending dimension.
        dim: Dim,
        /// Actual length.
        len: usize,
        /// Minimum length required.
        min: usize,
    },

    /// Returned when an index lies outside a dimension.
    #[error("index {index} out of range for '{dim}' of length {len}")]
    IndexOutOfRange {
        /// The indexed dimension.
        dim: Dim,
        /// Requested index.
        index: usize,
        /// Length of the dimension.
        len: usize,
    },
}

impl FieldError {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownDimension { .. }
            | Self::MissingAttribute { .. }
            | Self::NoSpacing { .. }
            | Self::IndexOutOfRange { .. } => ErrorKind::Configuration,
            Self::MissingVariable { .. } => ErrorKind::MissingVariable,
            Self::TimeAxisMismatch { .. }
            | Self::NonUniformSpacing { .. }
            | Self::ShapeMismatch { .. }
            | Self::InsufficientLength { .. } => ErrorKind::StructuralMismatch,
        }
    }
}
