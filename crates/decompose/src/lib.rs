//! Mean/perturbation decomposition of 4-D fields.
//!
//! A field is split along one dimension into a mean and a perturbation,
//! either with a static arithmetic mean (the mean axis collapses to length
//! 1) or with a LOWESS-smoothed mean of the same shape. On top of that,
//! [`turbulence_statistics`] derives the standard second moments and
//! turbulent kinetic energy for a whole [`Dataset`](mmc_field::Dataset).
//!
//! # Quick start
//!
//! ```rust
//! use mmc_decompose::{DecomposeConfig, Execution, MeanMode, SmoothingParams, decompose};
//! use mmc_field::{Dim, Field, silent};
//! use ndarray::Array4;
//!
//! let t0 = chrono::NaiveDate::from_ymd_opt(2018, 5, 11).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let times = (0..32).map(|i| t0 + chrono::TimeDelta::seconds(i)).collect();
//! let data = Array4::from_shape_fn((32, 2, 2, 2), |(t, ..)| (t as f64 * 0.4).sin());
//! let w = Field::new("w", data, times).unwrap();
//!
//! let config = DecomposeConfig::new(Dim::Time)
//!     .with_mode(MeanMode::Smoothed(SmoothingParams::new(8)))
//!     .with_execution(Execution::Sequential);
//! let parts = decompose(&w, &config, &silent).unwrap();
//! assert_eq!(parts.mean().shape(), [32, 2, 2, 2]);
//! ```

pub mod config;
pub mod decompose;
pub mod error;
pub mod turbulence;

pub use config::{DecomposeConfig, Execution, MeanMode, SmoothingParams};
pub use decompose::{Decomposition, MeanRecord, decompose};
pub use error::DecomposeError;
pub use turbulence::{PRESSURE, REQUIRED_VARIABLES, TurbulenceStats, turbulence_statistics};
