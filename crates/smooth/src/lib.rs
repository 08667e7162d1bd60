//! Locally weighted scatterplot smoothing.
//!
//! A LOWESS fit estimates each point by a weighted linear regression over
//! its `span` nearest neighbours, with tricube distance weights and optional
//! bisquare robustness iterations. Points closer than `delta` to the last
//! fitted point are linearly interpolated instead of fitted. The fits run
//! on the `lowess` crate; this crate binds one coordinate to many series
//! and maps its errors.
//!
//! ```rust
//! use mmc_smooth::{LowessConfig, lowess};
//!
//! let x: Vec<f64> = (0..10).map(f64::from).collect();
//! let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
//! let fit = lowess(&x, &y, &LowessConfig::new().with_iterations(0)).unwrap();
//! assert!((fit[5] - 11.0).abs() < 1e-9);
//! ```

pub mod error;
pub mod lowess;

pub use error::SmoothError;
pub use lowess::{Lowess, LowessConfig, lowess};
