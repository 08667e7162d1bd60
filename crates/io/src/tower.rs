//! Assembles the per-variable `tslist` files of one tower into a
//! [`FieldSet`].

use std::path::Path;

use chrono::{NaiveDateTime, TimeDelta};
use mmc_field::{DatasetKind, Field, FieldSet};
use mmc_formulas::speed_direction;
use ndarray::{Array2, Axis, Zip};
use tracing::{debug, info};

use crate::error::IoError;
use crate::tslist::{ProfileTable, SurfaceTable, read_profile, read_surface, variable_path};

/// Profile files that must be present, with the field name each becomes.
pub const REQUIRED_PROFILES: [(&str, &str); 4] =
    [("UU", "u"), ("VV", "v"), ("WW", "w"), ("TH", "theta")];

/// Profile files read when present.
pub const OPTIONAL_PROFILES: [(&str, &str); 3] = [("QV", "qv"), ("PH", "ph"), ("PP", "p")];

// ---------------------------------------------------------------------------
// TowerConfig
// ---------------------------------------------------------------------------

/// How to interpret a tower's files.
#[derive(Debug, Clone)]
pub struct TowerConfig {
    /// Timestamp of model hour zero.
    start: NaiveDateTime,
    /// Whether to read the `TS` surface file when present.
    surface: bool,
}

impl TowerConfig {
    /// Configuration for a run starting at `start`.
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            start,
            surface: true,
        }
    }

    /// Enables or disables reading the surface file.
    pub fn with_surface(mut self, surface: bool) -> Self {
        self.surface = surface;
        self
    }

    /// Returns the run start.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Returns `true` if the surface file is read.
    pub fn surface(&self) -> bool {
        self.surface
    }

    /// Converts model hours to a timestamp, rounded to the millisecond.
    pub fn timestamp(&self, hours: f64) -> NaiveDateTime {
        self.start + TimeDelta::milliseconds((hours * 3_600_000.0).round() as i64)
    }
}

// ---------------------------------------------------------------------------
// Tower
// ---------------------------------------------------------------------------

/// Everything read for one tower.
#[derive(Debug, Clone)]
pub struct Tower {
    /// Fields of shape `(nt, nz, 1, 1)`: `u v w theta wspd wdir` plus any
    /// optional profiles present.
    pub fields: FieldSet,
    /// Time-mean geopotential height per level, when `PH` is present.
    pub heights: Option<Vec<f64>>,
    /// Surface table, when `TS` is present and enabled.
    pub surface: Option<SurfaceTable>,
}

/// Reads the tower whose files share `prefix` (e.g. `/run/T1.d02`).
///
/// Station metadata from the `TS` header is attached to every field as
/// attributes (`station`, `abbreviation`, `lat`, `lon`, `i`, `j`,
/// `elevation`).
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`IoError::FileNotFound`] | a required profile file is missing |
/// | [`IoError::Parse`] | a file is malformed |
/// | [`IoError::Inconsistent`] | files disagree in time axis or level count, or are empty |
#[tracing::instrument(skip_all, fields(prefix = %prefix.display()))]
pub fn read_tower(prefix: &Path, config: &TowerConfig) -> Result<Tower, IoError> {
    let mut profiles: Vec<(&str, &str, ProfileTable)> = Vec::new();
    for (var, name) in REQUIRED_PROFILES {
        profiles.push((var, name, read_profile(&variable_path(prefix, var))?));
    }
    for (var, name) in OPTIONAL_PROFILES {
        let path = variable_path(prefix, var);
        if path.exists() {
            profiles.push((var, name, read_profile(&path)?));
        } else {
            debug!(var, "optional profile absent");
        }
    }

    let (reference_var, _, reference) = &profiles[0];
    if reference.hours.is_empty() || reference.levels() == 0 {
        return Err(IoError::Inconsistent {
            reason: format!("{reference_var} holds no data"),
        });
    }
    for (var, _, table) in &profiles[1..] {
        if table.hours != reference.hours {
            return Err(IoError::Inconsistent {
                reason: format!("{var} time axis differs from {reference_var}"),
            });
        }
        if table.levels() != reference.levels() {
            return Err(IoError::Inconsistent {
                reason: format!(
                    "{var} has {} levels, {reference_var} has {}",
                    table.levels(),
                    reference.levels()
                ),
            });
        }
    }
    let times: Vec<NaiveDateTime> = reference
        .hours
        .iter()
        .map(|&h| config.timestamp(h))
        .collect();

    let surface_path = variable_path(prefix, "TS");
    let surface = if config.surface() && surface_path.exists() {
        Some(read_surface(&surface_path)?)
    } else {
        None
    };

    let mut fields = FieldSet::new(DatasetKind::Tower);
    if let Some(s) = &surface {
        let h = &s.header;
        fields = fields
            .with_attr("station", h.name.as_str())
            .with_attr("abbreviation", h.abbreviation.as_str())
            .with_attr("lat", h.lat)
            .with_attr("lon", h.lon)
            .with_attr("i", h.i)
            .with_attr("j", h.j)
            .with_attr("elevation", h.elevation);
    }

    let heights = profiles
        .iter()
        .find(|(var, _, _)| *var == "PH")
        .and_then(|(_, _, t)| t.values.mean_axis(Axis(0)))
        .map(|m| m.to_vec());

    let (mut u, mut v) = (None, None);
    for (_, name, table) in profiles {
        if name == "u" {
            u = Some(table.values.clone());
        } else if name == "v" {
            v = Some(table.values.clone());
        }
        fields.insert(column_field(name, table.values, &times)?)?;
    }
    if let (Some(u), Some(v)) = (u, v) {
        let mut speed = Array2::zeros(u.raw_dim());
        let mut direction = Array2::zeros(u.raw_dim());
        Zip::from(&mut speed)
            .and(&mut direction)
            .and(&u)
            .and(&v)
            .for_each(|s, d, &u, &v| (*s, *d) = speed_direction(u, v));
        fields.insert(column_field("wspd", speed, &times)?)?;
        fields.insert(column_field("wdir", direction, &times)?)?;
    }

    info!(
        nt = times.len(),
        nz = reference_levels(&fields),
        n_fields = fields.len(),
        "tower read"
    );
    Ok(Tower {
        fields,
        heights,
        surface,
    })
}

fn reference_levels(fields: &FieldSet) -> usize {
    fields.shape().map_or(0, |s| s[1])
}

/// Lifts an `(nt, nz)` table to a single-column `(nt, nz, 1, 1)` field.
fn column_field(
    name: &str,
    values: Array2<f64>,
    times: &[NaiveDateTime],
) -> Result<Field, IoError> {
    let data = values.insert_axis(Axis(2)).insert_axis(Axis(3));
    Ok(Field::new(name, data, times.to_vec())?)
}
