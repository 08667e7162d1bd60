//! Moist thermodynamics: vapour pressure, humidity and temperature conversions.
//!
//! Temperatures are in kelvin and pressures in millibar (hPa) unless a
//! function name says otherwise.

use std::str::FromStr;

use crate::error::FormulaError;

/// Ratio of the molecular weights of water and dry air.
pub const EPSILON: f64 = 0.622;

/// Offset between kelvin and degrees Celsius.
pub const ZERO_CELSIUS: f64 = 273.15;

/// Reference pressure for potential temperature [mb].
pub const P0: f64 = 1000.0;

/// Gas constant over specific heat of dry air, `R / cp = 287 / 1004`.
pub const KAPPA: f64 = 0.286;

/// Empirical fit used for saturation vapour pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SvpModel {
    /// Bolton (1980), valid from -30 to 35 °C.
    Bolton,
    /// Magnus form of Alduchov and Eskridge (1996), valid from -40 to 50 °C.
    Magnus,
    /// Tetens' formula as used by the US National Weather Service.
    #[default]
    Tetens,
}

impl FromStr for SvpModel {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bolton" => Ok(SvpModel::Bolton),
            "magnus" => Ok(SvpModel::Magnus),
            "tetens" => Ok(SvpModel::Tetens),
            _ => Err(FormulaError::UnknownModel { name: s.into() }),
        }
    }
}

/// Converts degrees Celsius to kelvin.
pub fn celsius_to_kelvin(t_c: f64) -> f64 {
    t_c + ZERO_CELSIUS
}

/// Converts kelvin to degrees Celsius.
pub fn kelvin_to_celsius(t_k: f64) -> f64 {
    t_k - ZERO_CELSIUS
}

/// Saturation vapour pressure of water [mb] at air temperature `t_k`.
pub fn saturation_vapor_pressure(t_k: f64, model: SvpModel) -> f64 {
    let t_c = kelvin_to_celsius(t_k);
    match model {
        SvpModel::Bolton => 6.112 * (17.67 * t_c / (t_c + 243.5)).exp(),
        SvpModel::Magnus => 6.1094 * (17.625 * t_c / (243.04 + t_c)).exp(),
        SvpModel::Tetens => 6.11 * 10f64.powf(7.5 * t_c / (237.3 + t_c)),
    }
}

/// Dewpoint temperature [K] from air temperature and relative humidity [%].
///
/// Inverts Tetens' formula applied to the actual vapour pressure.
pub fn dewpoint(t_k: f64, rh: f64) -> f64 {
    let e = rh / 100.0 * saturation_vapor_pressure(t_k, SvpModel::Tetens);
    let l = (e / 6.11).ln();
    celsius_to_kelvin(237.3 * l / (7.5 * std::f64::consts::LN_10 - l))
}

/// Saturation mixing ratio [kg/kg] at temperature `t_k` and pressure `p` [mb].
pub fn saturation_mixing_ratio(t_k: f64, p: f64) -> f64 {
    let es = saturation_vapor_pressure(t_k, SvpModel::Tetens);
    EPSILON * es / (p - es)
}

/// Moisture information from which virtual temperature can be derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Moisture {
    /// Station pressure [mb] and relative humidity [%].
    RelativeHumidity {
        /// Pressure [mb].
        p: f64,
        /// Relative humidity [%].
        rh: f64,
    },
    /// Water vapour partial pressure and total pressure [mb].
    VaporPressure {
        /// Vapour pressure [mb].
        e: f64,
        /// Pressure [mb].
        p: f64,
    },
    /// Water vapour mixing ratio [kg/kg].
    MixingRatio(f64),
    /// Dewpoint [K] and pressure [mb].
    Dewpoint {
        /// Dewpoint temperature [K].
        td: f64,
        /// Pressure [mb].
        p: f64,
    },
}

/// Virtual temperature [K] of moist air at temperature `t_k`.
pub fn virtual_temperature(t_k: f64, moisture: Moisture) -> f64 {
    match moisture {
        Moisture::RelativeHumidity { p, rh } => {
            let w = rh / 100.0 * saturation_mixing_ratio(t_k, p);
            from_mixing_ratio(t_k, w)
        }
        Moisture::VaporPressure { e, p } => from_vapor_pressure(t_k, e, p),
        Moisture::MixingRatio(w) => from_mixing_ratio(t_k, w),
        Moisture::Dewpoint { td, p } => {
            let e = saturation_vapor_pressure(td, SvpModel::Tetens);
            from_vapor_pressure(t_k, e, p)
        }
    }
}

fn from_mixing_ratio(t_k: f64, w: f64) -> f64 {
    t_k * (w / EPSILON + 1.0) / (1.0 + w)
}

fn from_vapor_pressure(t_k: f64, e: f64, p: f64) -> f64 {
    t_k / (1.0 - e / p * (1.0 - EPSILON))
}

/// Potential temperature [K] relative to the 1000 mb reference level.
///
/// Applied to virtual temperature this gives virtual potential temperature.
pub fn potential_temperature(t_k: f64, p: f64) -> f64 {
    potential_temperature_ref(t_k, p, P0)
}

/// Potential temperature [K] relative to an arbitrary reference pressure.
pub fn potential_temperature_ref(t_k: f64, p: f64, p0: f64) -> f64 {
    t_k * (p0 / p).powf(KAPPA)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tetens_at_freezing() {
        assert_relative_eq!(
            saturation_vapor_pressure(ZERO_CELSIUS, SvpModel::Tetens),
            6.11,
            epsilon = 1e-12
        );
    }

    #[test]
    fn models_agree_at_room_temperature() {
        let t = celsius_to_kelvin(20.0);
        let tetens = saturation_vapor_pressure(t, SvpModel::Tetens);
        for model in [SvpModel::Bolton, SvpModel::Magnus] {
            assert_relative_eq!(saturation_vapor_pressure(t, model), tetens, max_relative = 0.01);
        }
        // ~23.4 mb at 20 °C
        assert_relative_eq!(tetens, 23.4, epsilon = 0.1);
    }

    #[test]
    fn parse_model() {
        assert_eq!("Bolton".parse::<SvpModel>().unwrap(), SvpModel::Bolton);
        assert_eq!("tetens".parse::<SvpModel>().unwrap(), SvpModel::Tetens);
        assert!("Goff".parse::<SvpModel>().is_err());
    }

    #[test]
    fn dewpoint_saturated_equals_temperature() {
        let t = celsius_to_kelvin(15.0);
        assert_relative_eq!(dewpoint(t, 100.0), t, epsilon = 1e-9);
        assert!(dewpoint(t, 50.0) < t);
    }

    #[test]
    fn virtual_temperature_branches_agree() {
        let t = 300.0;
        let p = 950.0;
        let e = 20.0;
        let w = EPSILON * e / (p - e);
        let from_e = virtual_temperature(t, Moisture::VaporPressure { e, p });
        let from_w = virtual_temperature(t, Moisture::MixingRatio(w));
        assert_relative_eq!(from_e, from_w, epsilon = 1e-10);
        assert!(from_e > t);
    }

    #[test]
    fn virtual_temperature_dry_air() {
        assert_relative_eq!(virtual_temperature(290.0, Moisture::MixingRatio(0.0)), 290.0);
        let rh0 = virtual_temperature(290.0, Moisture::RelativeHumidity { p: 1000.0, rh: 0.0 });
        assert_relative_eq!(rh0, 290.0);
    }

    #[test]
    fn virtual_temperature_from_dewpoint() {
        let t = celsius_to_kelvin(25.0);
        let td = celsius_to_kelvin(18.0);
        let e = saturation_vapor_pressure(td, SvpModel::Tetens);
        assert_relative_eq!(
            virtual_temperature(t, Moisture::Dewpoint { td, p: 1010.0 }),
            virtual_temperature(t, Moisture::VaporPressure { e, p: 1010.0 })
        );
    }

    #[test]
    fn theta_reference_level() {
        assert_relative_eq!(potential_temperature(288.0, 1000.0), 288.0);
        assert!(potential_temperature(288.0, 850.0) > 288.0);
        assert_relative_eq!(
            potential_temperature(270.0, 500.0),
            270.0 * 2f64.powf(0.286),
            epsilon = 1e-12
        );
    }
}
