//! Distribution statistics of perturbation fields for the mmc statistics
//! engine: histograms against caller-supplied bin edges, skewness and excess
//! kurtosis, one set per (vertical level, horizontal location).
//!
//! # Quick start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use mmc_distribution::{DistributionRequest, distributions};
//! use mmc_field::{Dim, Field, silent};
//! use ndarray::Array4;
//!
//! let t0 = NaiveDate::from_ymd_opt(2018, 5, 11).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let times = (0..10).map(|i| t0 + chrono::TimeDelta::seconds(i)).collect();
//! let data = Array4::from_shape_fn((10, 2, 3, 4), |(t, _, _, x)| (t + x) as f64);
//! let w = Field::new("w", data, times).unwrap();
//! let mean = w.derive("wMean", w.data().mean_axis(ndarray::Axis(0)).unwrap().insert_axis(ndarray::Axis(0))).unwrap();
//!
//! let edges: Vec<f64> = (-8..=8).map(f64::from).collect();
//! let est = distributions(&w, &mean, &DistributionRequest::new(Dim::Y, edges), &silent).unwrap();
//! assert_eq!(est.counts().shape(), &[2, 3, 16]);
//! assert_eq!(est.n_samples()[[0, 0]], 40);
//! ```

pub mod error;
pub mod estimate;

pub use error::DistributionError;
pub use estimate::{DistributionEstimate, DistributionRequest, distributions};
