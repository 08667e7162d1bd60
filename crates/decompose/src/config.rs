//! Configuration for the mean/perturbation decomposition.

use mmc_field::Dim;

use crate::error::DecomposeError;

/// Parameters of the smoothed (LOWESS) mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParams {
    window_size: usize,
    delta: f64,
    iterations: usize,
}

impl SmoothingParams {
    /// Creates smoothing parameters for a window of `window_size` points.
    ///
    /// Defaults: `delta = 0.0`, `iterations = 3`.
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            delta: 0.0,
            iterations: 3,
        }
    }

    /// Sets the interpolation distance along the mean coordinate.
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Sets the number of robustifying iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Returns the window size in points.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Returns delta.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Returns the number of robustifying iterations.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Smoothing fraction for a series of `len` points.
    pub fn fraction(&self, len: usize) -> f64 {
        self.window_size as f64 / len as f64
    }

    fn validate(&self) -> Result<(), DecomposeError> {
        if self.window_size < 2 {
            return Err(DecomposeError::InvalidWindow {
                window_size: self.window_size,
                len: 0,
            });
        }
        if !self.delta.is_finite() || self.delta < 0.0 {
            return Err(DecomposeError::InvalidDelta { delta: self.delta });
        }
        Ok(())
    }
}

/// How the mean along the chosen dimension is estimated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeanMode {
    /// Arithmetic mean; the mean dimension collapses to length 1.
    Static,
    /// LOWESS-smoothed mean with the same shape as the input.
    Smoothed(SmoothingParams),
}

impl MeanMode {
    /// Resolves a mode by name, using `params` for the smoothed mode.
    ///
    /// # Errors
    ///
    /// Returns [`DecomposeError::UnknownMode`] for anything other than
    /// `static` or `smoothed` (case-insensitive).
    pub fn parse(name: &str, params: SmoothingParams) -> Result<Self, DecomposeError> {
        match name.to_lowercase().as_str() {
            "static" => Ok(MeanMode::Static),
            "smoothed" => Ok(MeanMode::Smoothed(params)),
            _ => Err(DecomposeError::UnknownMode { name: name.into() }),
        }
    }

    /// Canonical mode name.
    pub fn name(&self) -> &'static str {
        match self {
            MeanMode::Static => "static",
            MeanMode::Smoothed(_) => "smoothed",
        }
    }
}

/// Whether independent lanes are smoothed on the calling thread or on the
/// rayon pool. Both produce bit-identical results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// Process lanes one after another.
    Sequential,
    /// Process lanes of each slab in parallel.
    #[default]
    Parallel,
}

/// Configuration for [`decompose`](crate::decompose).
///
/// # Example
///
/// ```
/// use mmc_decompose::{DecomposeConfig, MeanMode, SmoothingParams};
/// use mmc_field::Dim;
///
/// let config = DecomposeConfig::new(Dim::Time)
///     .with_mode(MeanMode::Smoothed(SmoothingParams::new(600).with_delta(5.0)));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct DecomposeConfig {
    mean_dim: Dim,
    mode: MeanMode,
    execution: Execution,
}

impl DecomposeConfig {
    /// Creates a static-mean configuration along `mean_dim`.
    pub fn new(mean_dim: Dim) -> Self {
        Self {
            mean_dim,
            mode: MeanMode::Static,
            execution: Execution::default(),
        }
    }

    /// Sets the mean mode.
    pub fn with_mode(mut self, mode: MeanMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the execution strategy.
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Returns the mean dimension.
    pub fn mean_dim(&self) -> Dim {
        self.mean_dim
    }

    /// Returns the mean mode.
    pub fn mode(&self) -> MeanMode {
        self.mode
    }

    /// Returns the execution strategy.
    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Validates this configuration.
    ///
    /// The window size is checked against the series length only when the
    /// field is known, in [`decompose`](crate::decompose).
    pub fn validate(&self) -> Result<(), DecomposeError> {
        match self.mode {
            MeanMode::Static => Ok(()),
            MeanMode::Smoothed(params) => params.validate(),
        }
    }
}
