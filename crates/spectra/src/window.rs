//! Taper windows and detrending applied to each segment before the FFT.

use std::f64::consts::PI;
use std::str::FromStr;

use crate::error::SpectraError;

/// Window shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// Hamming, `0.54 - 0.46 cos`.
    Hamming,
    /// Hann, `0.5 - 0.5 cos`.
    Hann,
    /// Rectangular (no taper).
    Boxcar,
}

impl FromStr for WindowKind {
    type Err = SpectraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hamming" => Ok(WindowKind::Hamming),
            "hann" | "hanning" => Ok(WindowKind::Hann),
            "boxcar" | "rectangular" | "none" => Ok(WindowKind::Boxcar),
            _ => Err(SpectraError::UnknownName {
                what: "window",
                name: s.into(),
            }),
        }
    }
}

/// Whether the cosine period spans `n - 1` samples (symmetric, for filter
/// design and single-block spectra of non-periodic data) or `n` samples
/// (periodic, the usual choice for overlapping segments).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    /// Both end points equal, period `n - 1`.
    Symmetric,
    /// Period `n`; the last point is omitted from the symmetric `n + 1` window.
    Periodic,
}

/// A taper window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Window shape.
    pub kind: WindowKind,
    /// Symmetric or periodic variant.
    pub symmetry: Symmetry,
}

impl Window {
    /// Creates a window.
    pub fn new(kind: WindowKind, symmetry: Symmetry) -> Self {
        Self { kind, symmetry }
    }

    /// Symmetric Hamming window.
    pub fn hamming() -> Self {
        Self::new(WindowKind::Hamming, Symmetry::Symmetric)
    }

    /// Periodic Hann window.
    pub fn hann() -> Self {
        Self::new(WindowKind::Hann, Symmetry::Periodic)
    }

    /// Window coefficients for a segment of `n` samples.
    pub fn coefficients(&self, n: usize) -> Vec<f64> {
        if n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return vec![1.0];
        }
        let a = match self.kind {
            WindowKind::Hamming => 0.54,
            WindowKind::Hann => 0.5,
            WindowKind::Boxcar => return vec![1.0; n],
        };
        let period = match self.symmetry {
            Symmetry::Symmetric => (n - 1) as f64,
            Symmetry::Periodic => n as f64,
        };
        (0..n)
            .map(|i| a - (1.0 - a) * (2.0 * PI * i as f64 / period).cos())
            .collect()
    }
}

/// Trend removed from each segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detrend {
    /// Leave the segment unchanged.
    None,
    /// Subtract the segment mean.
    #[default]
    Constant,
    /// Subtract the least-squares line through the segment.
    Linear,
}

impl FromStr for Detrend {
    type Err = SpectraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "false" => Ok(Detrend::None),
            "constant" | "mean" => Ok(Detrend::Constant),
            "linear" => Ok(Detrend::Linear),
            _ => Err(SpectraError::UnknownName {
                what: "detrend",
                name: s.into(),
            }),
        }
    }
}

impl Detrend {
    /// Removes the trend from `x` in place.
    pub fn apply(&self, x: &mut [f64]) {
        let n = x.len();
        if n == 0 {
            return;
        }
        match self {
            Detrend::None => {}
            Detrend::Constant => {
                let mean = x.iter().sum::<f64>() / n as f64;
                x.iter_mut().for_each(|v| *v -= mean);
            }
            Detrend::Linear => {
                let tbar = (n as f64 - 1.0) / 2.0;
                let mean = x.iter().sum::<f64>() / n as f64;
                let (sxy, sxx) = x.iter().enumerate().fold((0.0, 0.0), |(sxy, sxx), (i, &v)| {
                    let dt = i as f64 - tbar;
                    (sxy + dt * (v - mean), sxx + dt * dt)
                });
                let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
                for (i, v) in x.iter_mut().enumerate() {
                    *v -= mean + slope * (i as f64 - tbar);
                }
            }
        }
    }
}
