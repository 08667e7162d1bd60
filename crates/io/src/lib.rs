//! # mmc-io
//!
//! Reads WRF `tslist` tower output into the [`FieldSet`](mmc_field::FieldSet)
//! consumed by the statistics crates.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use chrono::NaiveDate;
//! use mmc_field::{Dataset, Dim};
//! use mmc_io::{TowerConfig, read_tower};
//!
//! let start = NaiveDate::from_ymd_opt(2013, 11, 8).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let tower = read_tower(Path::new("run/T1.d02"), &TowerConfig::new(start)).unwrap();
//! println!("{} levels", tower.fields.dim_len(Dim::Height).unwrap_or(0));
//! ```

mod error;
mod tower;
mod tslist;

pub use error::IoError;
pub use tower::{OPTIONAL_PROFILES, REQUIRED_PROFILES, Tower, TowerConfig, read_tower};
pub use tslist::{
    ProfileTable, StationEntry, SurfaceTable, TowerHeader, read_profile, read_station_list,
    read_surface, variable_path,
};
