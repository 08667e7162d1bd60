//! Power-law wind profiles.

use crate::error::FormulaError;

/// Result of fitting a power-law exponent to a wind profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLawFit {
    /// Shear exponent, constrained to be non-negative.
    pub alpha: f64,
    /// Coefficient of determination of the fitted profile.
    pub r_squared: f64,
}

/// Wind speed at height `z` for a power-law profile through `(zref, uref)`.
pub fn power_law(z: f64, zref: f64, uref: f64, alpha: f64) -> f64 {
    uref * (z / zref).powf(alpha)
}

/// Fits the shear exponent `alpha` of `U = uref (z / zref)^alpha`.
///
/// Least squares in log space through the reference point, using only
/// heights above zero. A negative optimum is clamped to zero. `r_squared`
/// compares the fitted profile to `speed` over all supplied levels.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`FormulaError::LengthMismatch`] | `z` and `speed` differ in length |
/// | [`FormulaError::InsufficientData`] | no height above zero |
pub fn fit_power_law_alpha(
    z: &[f64],
    speed: &[f64],
    zref: f64,
    uref: f64,
) -> Result<PowerLawFit, FormulaError> {
    if z.len() != speed.len() {
        return Err(FormulaError::LengthMismatch {
            left: z.len(),
            right: speed.len(),
        });
    }
    let (sxy, sxx, n) = z
        .iter()
        .zip(speed)
        .filter(|&(&zi, _)| zi > 0.0)
        .fold((0.0, 0.0, 0usize), |(sxy, sxx, n), (&zi, &ui)| {
            let lz = (zi / zref).ln();
            let lu = (ui / uref).ln();
            (sxy + lz * lu, sxx + lz * lz, n + 1)
        });
    if n == 0 {
        return Err(FormulaError::InsufficientData { n, min: 1 });
    }
    let alpha = if sxx > 0.0 { (sxy / sxx).max(0.0) } else { 0.0 };

    let mean = speed.iter().sum::<f64>() / speed.len() as f64;
    let ss_res: f64 = z
        .iter()
        .zip(speed)
        .map(|(&zi, &ui)| (ui - power_law(zi, zref, uref, alpha)).powi(2))
        .sum();
    let ss_tot: f64 = speed.iter().map(|&ui| (ui - mean).powi(2)).sum();

    Ok(PowerLawFit {
        alpha,
        r_squared: 1.0 - ss_res / ss_tot,
    })
}
