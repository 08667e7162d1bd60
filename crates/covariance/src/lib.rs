//! Rolling and resampled covariance of timestamped series.
//!
//! Inputs are either one [`TimeSeries`] or a [`LeveledSeries`] holding
//! several heights as `(time, level, value)` rows; both arguments of
//! [`covariance`] must have the same structure.
//!
//! # Quick start
//!
//! ```rust
//! use chrono::{NaiveDate, TimeDelta};
//! use mmc_covariance::{CovarianceConfig, Series, TimeSeries, covariance};
//!
//! let t0 = NaiveDate::from_ymd_opt(2013, 11, 8).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let times: Vec<_> = (0..1200).map(|i| t0 + TimeDelta::seconds(i)).collect();
//! let w: Vec<f64> = (0..1200).map(|i| (i as f64 * 0.1).sin()).collect();
//! let ts: Vec<f64> = w.iter().map(|v| 300.0 + 0.5 * v).collect();
//!
//! let w = Series::from(TimeSeries::new(times.clone(), w).unwrap());
//! let ts = Series::from(TimeSeries::new(times, ts).unwrap());
//! let config = CovarianceConfig::new("10min".parse().unwrap()).with_resample(true);
//! let heat_flux = covariance(&ts, &w, &config).unwrap();
//! assert_eq!(heat_flux.len(), 2);
//! ```

pub mod covariance;
pub mod error;
pub mod interval;
pub mod series;

pub use covariance::{CovarianceConfig, covariance, variance};
pub use error::CovarianceError;
pub use interval::Interval;
pub use series::{LeveledSeries, Series, TimeSeries};
