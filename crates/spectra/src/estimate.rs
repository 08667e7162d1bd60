//! Single-block periodogram spectra of 4-D perturbation fields, averaged
//! along a second dimension.

use mmc_field::{Dim, Field, ProgressEvent, ProgressObserver, Stage, report};
use ndarray::{Array3, s};
use num_complex::Complex;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::{debug, info};

use crate::error::SpectraError;
use crate::welch::SegmentTransform;
use crate::window::{Detrend, Window};

/// Which lanes of a field enter a spectral estimate.
///
/// The spectral dimension is transformed, the averaging dimension is
/// averaged over, and the estimate is reported per vertical level and per
/// index of the location dimension (the one of time, y and x left over).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectralRequest {
    spectral_dim: Dim,
    average_dim: Dim,
    levels: Option<Vec<usize>>,
    locations: Option<Vec<usize>>,
}

impl SpectralRequest {
    /// Creates a request over all levels and locations.
    pub fn new(spectral_dim: Dim, average_dim: Dim) -> Self {
        Self {
            spectral_dim,
            average_dim,
            levels: None,
            locations: None,
        }
    }

    /// Restricts the estimate to the given vertical level indices.
    pub fn with_levels(mut self, levels: impl Into<Vec<usize>>) -> Self {
        self.levels = Some(levels.into());
        self
    }

    /// Restricts the estimate to the given indices of the location dimension.
    pub fn with_locations(mut self, locations: impl Into<Vec<usize>>) -> Self {
        self.locations = Some(locations.into());
        self
    }

    /// Returns the transformed dimension.
    pub fn spectral_dim(&self) -> Dim {
        self.spectral_dim
    }

    /// Returns the averaged dimension.
    pub fn average_dim(&self) -> Dim {
        self.average_dim
    }

    /// Returns the dimension locations are taken along.
    ///
    /// Only meaningful once [`validate`](Self::validate) has passed.
    pub fn location_dim(&self) -> Dim {
        [Dim::Time, Dim::Y, Dim::X]
            .into_iter()
            .find(|&d| d != self.spectral_dim && d != self.average_dim)
            .unwrap_or(Dim::Time)
    }

    /// Checks the dimension roles.
    pub fn validate(&self) -> Result<(), SpectraError> {
        if self.spectral_dim == Dim::Height {
            return Err(SpectraError::InvalidDimension {
                dim: self.spectral_dim,
                role: "spectral dimension",
            });
        }
        if self.average_dim == Dim::Height {
            return Err(SpectraError::InvalidDimension {
                dim: self.average_dim,
                role: "averaging dimension",
            });
        }
        if self.spectral_dim == self.average_dim {
            return Err(SpectraError::SameDimension {
                dim: self.spectral_dim,
            });
        }
        Ok(())
    }
}

/// Averaged spectra per (level, location).
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralEstimate {
    frequencies: Vec<f64>,
    power: Array3<f64>,
    levels: Vec<usize>,
    locations: Vec<usize>,
    spectral_dim: Dim,
    average_dim: Dim,
    location_dim: Dim,
    n_averaged: usize,
}

impl SpectralEstimate {
    /// Frequencies `k / (nblock · dt)` for `k < nblock / 2`.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Spectral values, shape `(levels, locations, frequencies)`.
    pub fn power(&self) -> &Array3<f64> {
        &self.power
    }

    /// Vertical level indices, in output order.
    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    /// Location indices, in output order.
    pub fn locations(&self) -> &[usize] {
        &self.locations
    }

    /// Returns the transformed dimension.
    pub fn spectral_dim(&self) -> Dim {
        self.spectral_dim
    }

    /// Returns the averaged dimension.
    pub fn average_dim(&self) -> Dim {
        self.average_dim
    }

    /// Returns the dimension locations are taken along.
    pub fn location_dim(&self) -> Dim {
        self.location_dim
    }

    /// Number of periodograms averaged into each spectrum.
    pub fn n_averaged(&self) -> usize {
        self.n_averaged
    }

    /// Spectrum at one level and location, both given as output positions.
    pub fn spectrum(&self, level_pos: usize, location_pos: usize) -> Option<Vec<f64>> {
        if level_pos >= self.levels.len() || location_pos >= self.locations.len() {
            return None;
        }
        Some(self.power.slice(s![level_pos, location_pos, ..]).to_vec())
    }

    /// Multiplicative `(lower, upper)` bounds of the `p` confidence interval.
    ///
    /// Each averaged periodogram contributes two degrees of freedom, so the
    /// estimate follows `S χ²_ν / ν` with `ν = 2 · n_averaged`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SpectraError::InvalidConfidence`] | `p` outside `(0, 1)` |
    /// | [`SpectraError::ChiSquared`] | distribution construction failed |
    pub fn confidence_factors(&self, p: f64) -> Result<(f64, f64), SpectraError> {
        if p.is_nan() || p <= 0.0 || p >= 1.0 {
            return Err(SpectraError::InvalidConfidence { p });
        }
        let dof = 2.0 * self.n_averaged as f64;
        let chi = ChiSquared::new(dof).map_err(|e| SpectraError::ChiSquared {
            dof,
            message: e.to_string(),
        })?;
        let alpha = 1.0 - p;
        let lower = dof / chi.inverse_cdf(1.0 - alpha / 2.0);
        let upper = dof / chi.inverse_cdf(alpha / 2.0);
        Ok((lower, upper))
    }
}

/// Spectra of the perturbation `field - mean`.
///
/// Every lane along the spectral dimension is mean-removed, tapered with a
/// symmetric Hamming window and transformed as a single block. The two-sided
/// density periodograms `|X|² dt / Σw²` are summed along the averaging
/// dimension, divided by the count, doubled, and truncated to the first
/// `nblock / 2` bins.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`SpectraError::InvalidDimension`] | spectral or averaging dimension is height |
/// | [`SpectraError::SameDimension`] | spectral and averaging dimension coincide |
/// | [`SpectraError::TooShort`] | spectral axis shorter than 2 or empty averaging axis |
/// | [`SpectraError::Field`] | spacing unresolvable, index out of range, mean does not broadcast |
#[tracing::instrument(skip_all, fields(
    field = field.name(),
    spectral_dim = %request.spectral_dim(),
    average_dim = %request.average_dim()
))]
pub fn power_spectra(
    field: &Field,
    mean: &Field,
    request: &SpectralRequest,
    progress: &dyn ProgressObserver,
) -> Result<SpectralEstimate, SpectraError> {
    let plan = Plan::resolve(field, request)?;
    let pert = field.anomaly(mean)?;
    let power = plan.accumulate(&pert, None, Stage::Spectra, progress);
    Ok(plan.finish(power))
}

/// Cospectra of the perturbations `field0 - mean0` and `field1 - mean1`.
///
/// Same scheme as [`power_spectra`], with each periodogram replaced by
/// `Re(X0 conj X1) + Re(X1 conj X0)`. The result is symmetric in its
/// arguments, and the cospectrum of a field with itself is twice its
/// power spectrum.
///
/// The combination `real(P0) conj(P1) + real(P1) conj(P0)` is taken as the
/// real part of the complex cross-power `X0 conj X1`, doubled; the real
/// parts are not taken before multiplying.
///
/// # Errors
///
/// As [`power_spectra`], plus [`SpectraError::Field`] if the two fields
/// differ in shape.
#[tracing::instrument(skip_all, fields(
    field0 = field0.name(),
    field1 = field1.name(),
    spectral_dim = %request.spectral_dim(),
    average_dim = %request.average_dim()
))]
pub fn cospectra(
    field0: &Field,
    mean0: &Field,
    field1: &Field,
    mean1: &Field,
    request: &SpectralRequest,
    progress: &dyn ProgressObserver,
) -> Result<SpectralEstimate, SpectraError> {
    if field0.shape() != field1.shape() {
        return Err(mmc_field::FieldError::ShapeMismatch {
            expected: field0.shape(),
            got: field1.shape(),
        }
        .into());
    }
    let plan = Plan::resolve(field0, request)?;
    let pert0 = field0.anomaly(mean0)?;
    let pert1 = field1.anomaly(mean1)?;
    let power = plan.accumulate(&pert0, Some(&pert1), Stage::Cospectra, progress);
    Ok(plan.finish(power))
}

/// Resolved geometry of one estimate.
struct Plan {
    spectral_dim: Dim,
    average_dim: Dim,
    location_dim: Dim,
    dt: f64,
    nblock: usize,
    n_averaged: usize,
    levels: Vec<usize>,
    locations: Vec<usize>,
}

impl Plan {
    fn resolve(field: &Field, request: &SpectralRequest) -> Result<Self, SpectraError> {
        request.validate()?;
        let spectral_dim = request.spectral_dim();
        let average_dim = request.average_dim();
        let location_dim = request.location_dim();

        let dt = field.spacing(spectral_dim)?;
        let nblock = field.len_of(spectral_dim);
        if nblock < 2 {
            return Err(SpectraError::TooShort { n: nblock, min: 2 });
        }
        let n_averaged = field.len_of(average_dim);
        if n_averaged == 0 {
            return Err(SpectraError::TooShort { n: 0, min: 1 });
        }

        let levels = match &request.levels {
            Some(levels) => levels.clone(),
            None => (0..field.len_of(Dim::Height)).collect(),
        };
        let locations = match &request.locations {
            Some(locations) => locations.clone(),
            None => (0..field.len_of(location_dim)).collect(),
        };
        for &k in &levels {
            field.check_index(Dim::Height, k)?;
        }
        for &j in &locations {
            field.check_index(location_dim, j)?;
        }

        debug!(dt, nblock, n_averaged, location_dim = %location_dim, "spectral plan");
        Ok(Self {
            spectral_dim,
            average_dim,
            location_dim,
            dt,
            nblock,
            n_averaged,
            levels,
            locations,
        })
    }

    /// Summed and normalised periodograms, shape `(levels, locations, nblock/2)`.
    fn accumulate(
        &self,
        a: &Field,
        b: Option<&Field>,
        stage: Stage,
        progress: &dyn ProgressObserver,
    ) -> Array3<f64> {
        let nfreq = self.nblock / 2;
        let transform = SegmentTransform::new(self.nblock, Window::hamming(), Detrend::Constant);
        let scale = self.dt / transform.window_power();
        let mut power = Array3::<f64>::zeros((self.levels.len(), self.locations.len(), nfreq));

        for (il, &level) in self.levels.iter().enumerate() {
            for (ij, &location) in self.locations.iter().enumerate() {
                let mut sum = vec![0.0; self.nblock];
                let mut first = true;
                for avg in 0..self.n_averaged {
                    let mut at = [0; 4];
                    at[Dim::Height.index()] = level;
                    at[self.location_dim.index()] = location;
                    at[self.average_dim.index()] = avg;

                    let xa = transform.transform(&a.lane(self.spectral_dim, at));
                    let periodogram: Vec<f64> = match b {
                        None => xa.iter().map(|x| x.norm_sqr() * scale).collect(),
                        Some(b) => {
                            let xb = transform.transform(&b.lane(self.spectral_dim, at));
                            xa.iter()
                                .zip(&xb)
                                .map(|(x0, x1)| co_power(*x0, *x1) * scale)
                                .collect()
                        }
                    };
                    if first {
                        sum = periodogram;
                        first = false;
                    } else {
                        for (s, p) in sum.iter_mut().zip(periodogram) {
                            *s += p;
                        }
                    }
                }
                let factor = 2.0 / self.n_averaged as f64;
                for (k, s) in sum.iter().take(nfreq).enumerate() {
                    power[[il, ij, k]] = s * factor;
                }
            }
            report(
                progress,
                ProgressEvent {
                    stage,
                    completed: il + 1,
                    total: self.levels.len(),
                },
            );
        }
        power
    }

    fn finish(self, power: Array3<f64>) -> SpectralEstimate {
        let nfreq = self.nblock / 2;
        let frequencies = (0..nfreq)
            .map(|k| k as f64 / (self.nblock as f64 * self.dt))
            .collect();
        info!(
            levels = self.levels.len(),
            locations = self.locations.len(),
            nfreq,
            "spectra estimated"
        );
        SpectralEstimate {
            frequencies,
            power,
            levels: self.levels,
            locations: self.locations,
            spectral_dim: self.spectral_dim,
            average_dim: self.average_dim,
            location_dim: self.location_dim,
            n_averaged: self.n_averaged,
        }
    }
}

fn co_power(x0: Complex<f64>, x1: Complex<f64>) -> f64 {
    (x0 * x1.conj()).re + (x1 * x0.conj()).re
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_dim_is_the_remaining_one() {
        assert_eq!(SpectralRequest::new(Dim::X, Dim::Time).location_dim(), Dim::Y);
        assert_eq!(SpectralRequest::new(Dim::Time, Dim::Y).location_dim(), Dim::X);
        assert_eq!(SpectralRequest::new(Dim::Y, Dim::X).location_dim(), Dim::Time);
    }

    #[test]
    fn request_validation() {
        assert!(matches!(
            SpectralRequest::new(Dim::Height, Dim::Time).validate(),
            Err(SpectraError::InvalidDimension { dim: Dim::Height, .. })
        ));
        assert!(matches!(
            SpectralRequest::new(Dim::X, Dim::Height).validate(),
            Err(SpectraError::InvalidDimension { dim: Dim::Height, .. })
        ));
        assert!(matches!(
            SpectralRequest::new(Dim::X, Dim::X).validate(),
            Err(SpectraError::SameDimension { dim: Dim::X })
        ));
        assert!(SpectralRequest::new(Dim::X, Dim::Time).validate().is_ok());
    }

    #[test]
    fn co_power_is_twice_norm_for_equal_inputs() {
        let x = Complex::new(1.5, -2.0);
        assert_eq!(co_power(x, x), 2.0 * x.norm_sqr());
        let y = Complex::new(0.3, 0.7);
        assert_eq!(co_power(x, y), co_power(y, x));
    }

    #[test]
    fn co_power_is_doubled_real_cross_power() {
        let x0 = Complex::new(1.0, 2.0);
        let x1 = Complex::new(3.0, -1.0);
        // X0 conj X1 = (1 + 2i)(3 + i) = 1 + 7i
        assert_eq!(co_power(x0, x1), 2.0);
        assert_eq!(co_power(x1, x0), 2.0);
        // Multiplying real parts first would give 2 * 1 * 3 = 6.
        assert_ne!(co_power(x0, x1), 2.0 * x0.re * x1.re);
    }
}
