//! LOWESS: locally weighted linear regression with tricube weights.

use lowess::prelude::{
    Batch, Bisquare, Lowess as LowessBuilder, MAR, NoBoundary, ReturnOriginal, Tricube,
};

use crate::error::SmoothError;

/// Configuration for a LOWESS fit.
///
/// # Example
///
/// ```
/// use mmc_smooth::LowessConfig;
///
/// let config = LowessConfig::new()
///     .with_fraction(0.1)
///     .with_delta(5.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct LowessConfig {
    fraction: f64,
    iterations: usize,
    delta: f64,
}

impl LowessConfig {
    /// Creates a configuration with defaults.
    ///
    /// Defaults: `fraction = 2/3`, `iterations = 3`, `delta = 0.0`.
    pub fn new() -> Self {
        Self {
            fraction: 2.0 / 3.0,
            iterations: 3,
            delta: 0.0,
        }
    }

    /// Sets the share of points used for each local fit.
    pub fn with_fraction(mut self, fraction: f64) -> Self {
        self.fraction = fraction;
        self
    }

    /// Sets the number of robustifying iterations after the initial fit.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the distance within which neighbouring points are interpolated
    /// instead of fitted.
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Returns the fraction.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Returns the number of robustifying iterations.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Returns delta.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), SmoothError> {
        if !(self.fraction > 0.0 && self.fraction <= 1.0) {
            return Err(SmoothError::InvalidFraction {
                fraction: self.fraction,
            });
        }
        if !self.delta.is_finite() || self.delta < 0.0 {
            return Err(SmoothError::InvalidDelta { delta: self.delta });
        }
        Ok(())
    }
}

impl Default for LowessConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A LOWESS smoother bound to one independent coordinate.
///
/// Validation happens once in [`Lowess::new`]; [`Lowess::fit`] is then
/// applied to many series sharing the same `x`. Each fit runs the batch
/// smoother of the `lowess` crate with tricube weights, bisquare robustness
/// scaled by six times the median absolute residual, and no boundary
/// padding.
#[derive(Clone, Debug)]
pub struct Lowess<'a> {
    x: &'a [f64],
    fraction: f64,
    span: usize,
    iterations: usize,
    delta: f64,
}

impl<'a> Lowess<'a> {
    /// Prepares a smoother over the ascending coordinate `x`.
    ///
    /// The neighbourhood size is `floor(fraction * n)`, clamped to `[2, n]`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SmoothError::InvalidFraction`] | fraction outside (0, 1] |
    /// | [`SmoothError::InvalidDelta`] | delta negative or not finite |
    /// | [`SmoothError::TooShort`] | fewer than 2 points |
    /// | [`SmoothError::Unsorted`] | `x` not ascending |
    pub fn new(x: &'a [f64], config: &LowessConfig) -> Result<Self, SmoothError> {
        config.validate()?;
        let n = x.len();
        if n < 2 {
            return Err(SmoothError::TooShort { n });
        }
        if let Some(index) = (1..n).find(|&i| x[i] < x[i - 1]) {
            return Err(SmoothError::Unsorted { index });
        }
        let span = ((config.fraction * n as f64 + 1e-5) as usize).clamp(2, n);
        // The backend turns fraction 1 into one global least-squares line;
        // a full-width local neighbourhood keeps the tricube fit instead.
        let fraction = if config.fraction >= 1.0 {
            1.0 - 5e-6 / n as f64
        } else {
            config.fraction
        };
        Ok(Self {
            x,
            fraction,
            span,
            iterations: config.iterations,
            delta: config.delta,
        })
    }

    /// Number of points in each local neighbourhood.
    pub fn span(&self) -> usize {
        self.span
    }

    /// Smooths `y`, returning the fitted values.
    ///
    /// A series holding NaN or infinity smooths to all NaN.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SmoothError::LengthMismatch`] | `y` and the coordinate differ in length |
    /// | [`SmoothError::Backend`] | the `lowess` crate rejects the fit |
    pub fn fit(&self, y: &[f64]) -> Result<Vec<f64>, SmoothError> {
        if y.len() != self.x.len() {
            return Err(SmoothError::LengthMismatch {
                x_len: self.x.len(),
                y_len: y.len(),
            });
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Ok(vec![f64::NAN; y.len()]);
        }
        let model = LowessBuilder::new()
            .fraction(self.fraction)
            .iterations(self.iterations)
            .delta(self.delta)
            .weight_function(Tricube)
            .robustness_method(Bisquare)
            .scaling_method(MAR)
            .boundary_policy(NoBoundary)
            .zero_weight_fallback(ReturnOriginal)
            .adapter(Batch)
            .build()?;
        Ok(model.fit(self.x, y)?.y)
    }
}

/// Smooths `y` against `x` in one call.
///
/// Convenience wrapper around [`Lowess::new`] and [`Lowess::fit`].
pub fn lowess(x: &[f64], y: &[f64], config: &LowessConfig) -> Result<Vec<f64>, SmoothError> {
    if x.len() != y.len() {
        return Err(SmoothError::LengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    Lowess::new(x, config)?.fit(y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Weighted least squares line evaluated at `at`.
    fn wls(x: &[f64], y: &[f64], w: &[f64], at: f64) -> f64 {
        let sw: f64 = w.iter().sum();
        let xbar = x.iter().zip(w).map(|(a, b)| a * b).sum::<f64>() / sw;
        let ybar = y.iter().zip(w).map(|(a, b)| a * b).sum::<f64>() / sw;
        let sxy: f64 = (0..x.len())
            .map(|j| w[j] * (x[j] - xbar) * (y[j] - ybar))
            .sum();
        let sxx: f64 = (0..x.len()).map(|j| w[j] * (x[j] - xbar).powi(2)).sum();
        ybar + sxy / sxx * (at - xbar)
    }

    #[test]
    fn span_from_fraction() {
        let x: Vec<f64> = (0..100).map(f64::from).collect();
        let cfg = LowessConfig::new().with_fraction(0.1);
        assert_eq!(Lowess::new(&x, &cfg).unwrap().span(), 10);
        let cfg = LowessConfig::new().with_fraction(0.001);
        assert_eq!(Lowess::new(&x, &cfg).unwrap().span(), 2);
    }

    #[test]
    fn matches_hand_computed_tricube_fit() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.0, 1.0, 5.0, 2.0, 0.5];
        let cfg = LowessConfig::new().with_fraction(1.0).with_iterations(0);
        let fit = lowess(&x, &y, &cfg).unwrap();

        // Centre point: radius 2, neighbours at distance 1 get (1 - 1/8)^3.
        let w = 0.875_f64.powi(3);
        let centre = (w * 1.0 + 5.0 + w * 2.0) / (1.0 + 2.0 * w);
        assert_relative_eq!(fit[2], centre, epsilon = 1e-12);

        // Left end: radius 4, weights (1 - (d/4)^3)^3; the far end gets 0.
        let w0: Vec<f64> = x
            .iter()
            .map(|&d| if d < 4.0 { (1.0 - (d / 4.0_f64).powi(3)).powi(3) } else { 0.0 })
            .collect();
        assert_relative_eq!(fit[0], wls(&x, &y, &w0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn reproduces_straight_line() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|&v| 3.0 - 0.25 * v).collect();
        for delta in [0.0, 2.0] {
            let cfg = LowessConfig::new()
                .with_fraction(0.2)
                .with_iterations(0)
                .with_delta(delta);
            let fit = lowess(&x, &y, &cfg).unwrap();
            for (f, e) in fit.iter().zip(&y) {
                assert_relative_eq!(*f, *e, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn constant_series_unchanged() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y = vec![7.5; 20];
        let fit = lowess(&x, &y, &LowessConfig::new().with_fraction(0.3)).unwrap();
        for v in fit {
            assert_relative_eq!(v, 7.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn delta_skips_and_interpolates() {
        let x: Vec<f64> = (0..40).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| (v * 0.3).sin()).collect();
        let cfg = LowessConfig::new()
            .with_fraction(0.25)
            .with_iterations(0)
            .with_delta(3.0);
        let fit = lowess(&x, &y, &cfg).unwrap();
        // Points 0 and 3 are fitted; 1 and 2 lie on the chord between them.
        for j in 1..3 {
            let t = j as f64 / 3.0;
            assert_relative_eq!(fit[j], fit[0] + t * (fit[3] - fit[0]), epsilon = 1e-12);
        }
    }

    #[test]
    fn robustness_downweights_outlier() {
        let x: Vec<f64> = (0..30).map(f64::from).collect();
        let mut y: Vec<f64> = x.iter().map(|&v| 0.5 * v + 0.1 * (1.7 * v).sin()).collect();
        y[15] += 40.0;
        let plain = lowess(&x, &y, &LowessConfig::new().with_fraction(0.3).with_iterations(0))
            .unwrap();
        let robust = lowess(&x, &y, &LowessConfig::new().with_fraction(0.3)).unwrap();
        let err_plain = (plain[14] - 7.0).abs();
        let err_robust = (robust[14] - 7.0).abs();
        assert!(err_robust < err_plain);
        assert!(err_robust < 0.3);
    }

    #[test]
    fn ties_share_fit() {
        let x = [0.0, 1.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 3.0, 2.0, 3.0];
        let fit = lowess(&x, &y, &LowessConfig::new().with_fraction(1.0)).unwrap();
        assert_eq!(fit[1], fit[2]);
    }

    #[test]
    fn non_finite_series_smooths_to_nan() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let mut y = vec![1.0; 10];
        y[4] = f64::NAN;
        let fit = lowess(&x, &y, &LowessConfig::new()).unwrap();
        assert!(fit.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn prepared_fit_checks_length() {
        let x = [0.0, 1.0, 2.0];
        let smoother = Lowess::new(&x, &LowessConfig::new()).unwrap();
        assert!(matches!(
            smoother.fit(&[1.0, 2.0]),
            Err(SmoothError::LengthMismatch { x_len: 3, y_len: 2 })
        ));
    }

    #[test]
    fn rejects_bad_input() {
        let cfg = LowessConfig::new();
        assert!(matches!(
            lowess(&[0.0], &[1.0], &cfg),
            Err(SmoothError::TooShort { n: 1 })
        ));
        assert!(matches!(
            lowess(&[0.0, 2.0, 1.0], &[1.0, 1.0, 1.0], &cfg),
            Err(SmoothError::Unsorted { index: 2 })
        ));
        assert!(matches!(
            lowess(&[0.0, 1.0], &[1.0], &cfg),
            Err(SmoothError::LengthMismatch { .. })
        ));
        assert!(matches!(
            lowess(&[0.0, 1.0], &[1.0, 2.0], &cfg.clone().with_fraction(0.0)),
            Err(SmoothError::InvalidFraction { .. })
        ));
        assert!(matches!(
            lowess(&[0.0, 1.0], &[1.0, 2.0], &LowessConfig::new().with_delta(-1.0)),
            Err(SmoothError::InvalidDelta { .. })
        ));
    }
}
