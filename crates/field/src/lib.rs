//! Labelled 4-D fields and the dataset abstraction for the mmc statistics
//! engine.
//!
//! Every array is stored in canonical `(time, height, y, x)` order. A
//! [`Field`] carries its timestamps and an attribute map (grid spacing,
//! provenance), a [`Dataset`] hands named fields to the estimators without
//! exposing where they came from.
//!
//! # Quick start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use mmc_field::{Dataset, DatasetKind, Dim, Field, FieldSet};
//! use ndarray::Array4;
//!
//! let t0 = NaiveDate::from_ymd_opt(2018, 5, 11).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let times = (0..4).map(|i| t0 + chrono::TimeDelta::seconds(i)).collect();
//! let u = Field::new("u", Array4::zeros((4, 2, 3, 3)), times)
//!     .unwrap()
//!     .with_spacing(30.0, 30.0);
//!
//! let set = FieldSet::new(DatasetKind::ModelGrid).with_field(u).unwrap();
//! assert_eq!(set.dim_len(Dim::Height), Some(2));
//! assert_eq!(set.require("u").unwrap().spacing(Dim::X).unwrap(), 30.0);
//! ```

pub mod dataset;
pub mod dim;
pub mod error;
pub mod field;
pub mod progress;

pub use dataset::{Dataset, DatasetKind, FieldSet};
pub use dim::Dim;
pub use error::{ErrorKind, FieldError};
pub use field::{Attribute, DX, DY, Field, time_step};
pub use progress::{ProgressEvent, ProgressObserver, Stage, report, silent};
