//! Error types for the mmc-smooth crate.

/// Error type for all fallible operations in the mmc-smooth crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SmoothError {
    /// Returned when the smoothing fraction lies outside (0, 1].
    #[error("smoothing fraction must be in (0, 1], got {fraction}")]
    InvalidFraction {
        /// The offending fraction.
        fraction: f64,
    },

    /// Returned when `delta` is negative or not finite.
    #[error("delta must be finite and non-negative, got {delta}")]
    InvalidDelta {
        /// The offending delta.
        delta: f64,
    },

    /// Returned when the independent coordinate has fewer than two points.
    #[error("need at least 2 points to smooth, got {n}")]
    TooShort {
        /// Number of points supplied.
        n: usize,
    },

    /// Returned when the independent coordinate is not sorted ascending.
    #[error("x must be sorted ascending (violated at index {index})")]
    Unsorted {
        /// First index where `x[index] < x[index - 1]`.
        index: usize,
    },

    /// Returned when `x` and `y` differ in length.
    #[error("length mismatch: x has {x_len} elements, y has {y_len}")]
    LengthMismatch {
        /// Length of `x`.
        x_len: usize,
        /// Length of `y`.
        y_len: usize,
    },

    /// Returned when the `lowess` crate rejects a configuration or series.
    #[error(transparent)]
    Backend(#[from] lowess::prelude::LowessError),
}
