//! Standard meteorological formulas used around the mmc statistics engine.
//!
//! - [`thermo`]: saturation vapour pressure, dewpoint, mixing ratio, virtual
//!   and potential temperature.
//! - [`wind`]: speed/direction from velocity components and back.
//! - [`profile`]: power-law wind profile and its exponent fit.
//! - [`grid`]: WRF grid helpers (destaggering, geometric height, nearest
//!   grid point).

pub mod error;
pub mod grid;
pub mod profile;
pub mod thermo;
pub mod wind;

pub use error::FormulaError;
pub use grid::{GRAVITY, height_from_geopotential, nearest_grid_index, unstagger};
pub use profile::{PowerLawFit, fit_power_law_alpha, power_law};
pub use thermo::{
    Moisture, SvpModel, dewpoint, potential_temperature, saturation_mixing_ratio,
    saturation_vapor_pressure, virtual_temperature,
};
pub use wind::{components, speed_direction};
