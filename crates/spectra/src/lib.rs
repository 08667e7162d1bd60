//! Spectral estimation for the mmc statistics engine.
//!
//! Two families of estimators live here:
//!
//! - [`power_spectra`] and [`cospectra`] work on 4-D fields. Each lane along
//!   a spectral dimension (x, y or time) is transformed as one Hamming-tapered
//!   block and the periodograms are averaged along a second dimension.
//! - [`welch`], [`csd`] and [`power_spectral_density`] work on 1-D series
//!   with overlapping segments, as used for tower records.
//!
//! # Quick start
//!
//! ```rust
//! use mmc_spectra::{WelchConfig, welch};
//!
//! let x: Vec<f64> = (0..512).map(|i| (i as f64 * 0.5).sin()).collect();
//! let s = welch(&x, 1.0, &WelchConfig::new().with_segment_length(128)).unwrap();
//! assert_eq!(s.frequencies.len(), 65);
//! ```

pub mod error;
pub mod estimate;
pub mod welch;
pub mod window;

pub use error::SpectraError;
pub use estimate::{SpectralEstimate, SpectralRequest, cospectra, power_spectra};
pub use welch::{
    CrossSpectrum, DEFAULT_SEGMENT_LENGTH, DEFAULT_SEGMENT_SECONDS, PsdConfig, Scaling, Sides,
    Spectrum, WelchConfig, csd, power_spectral_density, welch,
};
pub use window::{Detrend, Symmetry, Window, WindowKind};
