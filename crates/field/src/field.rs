//! The labelled 4-D field type.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use ndarray::{Array4, ArrayView4};

use crate::dim::Dim;
use crate::error::FieldError;

/// Attribute key for the west-east grid spacing in metres.
pub const DX: &str = "DX";
/// Attribute key for the south-north grid spacing in metres.
pub const DY: &str = "DY";

/// A metadata value attached to a field or dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// Numeric attribute (grid spacing, smoothing window, ...).
    Number(f64),
    /// Free-form text attribute (mode names, descriptions).
    Text(String),
}

impl Attribute {
    /// Returns the numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Attribute::Number(v) => Some(*v),
            Attribute::Text(_) => None,
        }
    }

    /// Returns the text value, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Attribute::Text(s) => Some(s),
            Attribute::Number(_) => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Number(v) => write!(f, "{v}"),
            Attribute::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Attribute {
    fn from(v: f64) -> Self {
        Attribute::Number(v)
    }
}

impl From<usize> for Attribute {
    fn from(v: usize) -> Self {
        Attribute::Number(v as f64)
    }
}

impl From<&str> for Attribute {
    fn from(s: &str) -> Self {
        Attribute::Text(s.to_string())
    }
}

impl From<String> for Attribute {
    fn from(s: String) -> Self {
        Attribute::Text(s)
    }
}

/// Converts a time delta to fractional seconds.
pub(crate) fn delta_seconds(delta: TimeDelta) -> f64 {
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 * 1e-9,
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}

/// A named 4-D array in canonical `(time, height, y, x)` order.
///
/// Carries one timestamp per time index and an attribute map (grid spacing
/// under [`DX`]/[`DY`], provenance records). Fields are never mutated in
/// place: every transformation returns a new `Field`.
#[derive(Clone, Debug)]
pub struct Field {
    name: String,
    data: Array4<f64>,
    times: Vec<NaiveDateTime>,
    attrs: BTreeMap<String, Attribute>,
}

impl Field {
    /// Creates a new field.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`FieldError::TimeAxisMismatch`] | `times.len()` differs from the time axis length |
    pub fn new(
        name: impl Into<String>,
        data: Array4<f64>,
        times: Vec<NaiveDateTime>,
    ) -> Result<Self, FieldError> {
        let nt = data.len_of(Dim::Time.axis());
        if times.len() != nt {
            return Err(FieldError::TimeAxisMismatch {
                times: times.len(),
                len: nt,
            });
        }
        Ok(Self {
            name: name.into(),
            data,
            times,
            attrs: BTreeMap::new(),
        })
    }

    /// Attaches an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Attribute>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Attaches all attributes from `attrs`, keeping existing keys.
    pub fn with_default_attrs(mut self, attrs: &BTreeMap<String, Attribute>) -> Self {
        for (k, v) in attrs {
            self.attrs.entry(k.clone()).or_insert_with(|| v.clone());
        }
        self
    }

    /// Replaces the field name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the horizontal grid spacing attributes.
    pub fn with_spacing(self, dx: f64, dy: f64) -> Self {
        self.with_attr(DX, dx).with_attr(DY, dy)
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the underlying array.
    pub fn data(&self) -> &Array4<f64> {
        &self.data
    }

    /// Returns a view of the underlying array.
    pub fn view(&self) -> ArrayView4<'_, f64> {
        self.data.view()
    }

    /// Consumes the field, returning the array.
    pub fn into_data(self) -> Array4<f64> {
        self.data
    }

    /// Returns the shape in canonical order.
    pub fn shape(&self) -> [usize; 4] {
        let s = self.data.shape();
        [s[0], s[1], s[2], s[3]]
    }

    /// Returns the length of `dim`.
    pub fn len_of(&self, dim: Dim) -> usize {
        self.data.len_of(dim.axis())
    }

    /// Returns the timestamps.
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Returns all attributes.
    pub fn attrs(&self) -> &BTreeMap<String, Attribute> {
        &self.attrs
    }

    /// Returns the attribute stored under `key`.
    pub fn attr(&self, key: &str) -> Option<&Attribute> {
        self.attrs.get(key)
    }

    /// Returns the numeric attribute stored under `key`.
    pub fn number_attr(&self, key: &str) -> Option<f64> {
        self.attr(key).and_then(Attribute::as_number)
    }

    /// Returns the time step in seconds.
    ///
    /// Timestamps must be equidistant (relative tolerance 1e-5).
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`FieldError::InsufficientLength`] | fewer than 2 timestamps |
    /// | [`FieldError::NonUniformSpacing`] | timestamps not equally spaced |
    pub fn time_step(&self) -> Result<f64, FieldError> {
        time_step(&self.times)
    }

    /// Returns the sample spacing along `dim`.
    ///
    /// Spatial spacing comes from the [`DX`]/[`DY`] attributes, temporal
    /// spacing from the timestamps (seconds).
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`FieldError::NoSpacing`] | `dim` is [`Dim::Height`] |
    /// | [`FieldError::MissingAttribute`] | `DX`/`DY` absent |
    /// | [`FieldError::NonUniformSpacing`] | timestamps not equally spaced |
    pub fn spacing(&self, dim: Dim) -> Result<f64, FieldError> {
        match dim {
            Dim::Time => self.time_step(),
            Dim::X => self
                .number_attr(DX)
                .ok_or_else(|| FieldError::MissingAttribute { key: DX.into() }),
            Dim::Y => self
                .number_attr(DY)
                .ok_or_else(|| FieldError::MissingAttribute { key: DY.into() }),
            Dim::Height => Err(FieldError::NoSpacing { dim }),
        }
    }

    /// Returns coordinate values along `dim`.
    ///
    /// Time: seconds since the first timestamp. X/Y: `i * DX`/`i * DY` when
    /// the spacing attribute is present, otherwise the index. Height: index.
    pub fn coordinates(&self, dim: Dim) -> Vec<f64> {
        let n = self.len_of(dim);
        match dim {
            Dim::Time => {
                let t0 = self.times.first().copied();
                self.times
                    .iter()
                    .map(|&t| t0.map_or(0.0, |t0| delta_seconds(t - t0)))
                    .collect()
            }
            Dim::X | Dim::Y => {
                let step = self.spacing(dim).unwrap_or(1.0);
                (0..n).map(|i| i as f64 * step).collect()
            }
            Dim::Height => (0..n).map(|i| i as f64).collect(),
        }
    }

    /// Checks that `index` lies within `dim`.
    pub fn check_index(&self, dim: Dim, index: usize) -> Result<(), FieldError> {
        let len = self.len_of(dim);
        if index >= len {
            return Err(FieldError::IndexOutOfRange { dim, index, len });
        }
        Ok(())
    }

    /// Creates a new field with this field's metadata and different data.
    ///
    /// Every axis of `data` must either match this field or have length 1
    /// (a collapsed mean axis). A collapsed time axis keeps the first
    /// timestamp.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`FieldError::ShapeMismatch`] | an axis differs and is not of length 1 |
    pub fn derive(&self, name: impl Into<String>, data: Array4<f64>) -> Result<Self, FieldError> {
        let expected = self.shape();
        let s = data.shape();
        let got = [s[0], s[1], s[2], s[3]];
        if expected.iter().zip(got.iter()).any(|(&e, &g)| e != g && g != 1) {
            return Err(FieldError::ShapeMismatch { expected, got });
        }
        let times = if got[0] == expected[0] {
            self.times.clone()
        } else {
            self.times.iter().take(1).copied().collect()
        };
        Ok(Self {
            name: name.into(),
            data,
            times,
            attrs: self.attrs.clone(),
        })
    }

    /// Subtracts `mean`, broadcasting it along any axis of length 1.
    ///
    /// The result is named `<name>Pert`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ShapeMismatch`] if `mean` does not broadcast
    /// to this field's shape.
    pub fn anomaly(&self, mean: &Field) -> Result<Self, FieldError> {
        let mean_view = mean
            .data
            .broadcast(self.data.raw_dim())
            .ok_or(FieldError::ShapeMismatch {
                expected: self.shape(),
                got: mean.shape(),
            })?;
        let data = &self.data - &mean_view;
        self.derive(format!("{}Pert", self.name), data)
    }

    /// Applies `f` elementwise, producing a new field named `name`.
    pub fn map(&self, name: impl Into<String>, f: impl Fn(f64) -> f64) -> Self {
        Self {
            name: name.into(),
            data: self.data.mapv(f),
            times: self.times.clone(),
            attrs: self.attrs.clone(),
        }
    }

    /// Extracts the 1-D series along `dim` through the point `at`.
    ///
    /// The entry of `at` belonging to `dim` is ignored.
    ///
    /// # Panics
    ///
    /// Panics if any other entry of `at` is out of bounds.
    pub fn lane(&self, dim: Dim, at: [usize; 4]) -> Vec<f64> {
        let mut idx = at;
        (0..self.len_of(dim))
            .map(|i| {
                idx[dim.index()] = i;
                self.data[idx]
            })
            .collect()
    }
}

/// Returns the equidistant step of `times` in seconds.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`FieldError::InsufficientLength`] | fewer than 2 timestamps |
/// | [`FieldError::NonUniformSpacing`] | steps differ (relative tolerance 1e-5) or are not positive |
pub fn time_step(times: &[NaiveDateTime]) -> Result<f64, FieldError> {
    if times.len() < 2 {
        return Err(FieldError::InsufficientLength {
            dim: Dim::Time,
            len: times.len(),
            min: 2,
        });
    }
    let dt = delta_seconds(times[1] - times[0]);
    let uniform = times
        .windows(2)
        .map(|w| delta_seconds(w[1] - w[0]))
        .all(|d| (d - dt).abs() <= 1e-8 + 1e-5 * dt.abs());
    if !uniform || dt <= 0.0 {
        return Err(FieldError::NonUniformSpacing { dim: Dim::Time });
    }
    Ok(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn times(n: usize, step_s: i64) -> Vec<NaiveDateTime> {
        let t0 = NaiveDate::from_ymd_opt(2018, 5, 11)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n as i64)
            .map(|i| t0 + TimeDelta::seconds(i * step_s))
            .collect()
    }

    fn field() -> Field {
        let data = Array4::from_shape_fn((4, 2, 3, 5), |(t, z, y, x)| {
            (t * 1000 + z * 100 + y * 10 + x) as f64
        });
        Field::new("u", data, times(4, 10)).unwrap().with_spacing(30.0, 40.0)
    }

    #[test]
    fn new_rejects_time_mismatch() {
        let err = Field::new("u", Array4::zeros((3, 1, 1, 1)), times(2, 1)).unwrap_err();
        assert!(matches!(
            err,
            FieldError::TimeAxisMismatch { times: 2, len: 3 }
        ));
    }

    #[test]
    fn shape_and_len() {
        let f = field();
        assert_eq!(f.shape(), [4, 2, 3, 5]);
        assert_eq!(f.len_of(Dim::X), 5);
        assert_eq!(f.name(), "u");
    }

    #[test]
    fn spacing_lookup() {
        let f = field();
        assert_relative_eq!(f.spacing(Dim::X).unwrap(), 30.0);
        assert_relative_eq!(f.spacing(Dim::Y).unwrap(), 40.0);
        assert_relative_eq!(f.spacing(Dim::Time).unwrap(), 10.0);
        assert!(matches!(
            f.spacing(Dim::Height),
            Err(FieldError::NoSpacing { dim: Dim::Height })
        ));
    }

    #[test]
    fn spacing_missing_attribute() {
        let f = Field::new("u", Array4::zeros((2, 1, 1, 1)), times(2, 1)).unwrap();
        assert!(matches!(
            f.spacing(Dim::X),
            Err(FieldError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn time_step_non_uniform() {
        let mut ts = times(4, 10);
        ts[3] += TimeDelta::seconds(3);
        let f = Field::new("u", Array4::zeros((4, 1, 1, 1)), ts).unwrap();
        assert!(matches!(
            f.time_step(),
            Err(FieldError::NonUniformSpacing { dim: Dim::Time })
        ));
    }

    #[test]
    fn coordinates() {
        let f = field();
        assert_eq!(f.coordinates(Dim::Time), vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(f.coordinates(Dim::X), vec![0.0, 30.0, 60.0, 90.0, 120.0]);
        assert_eq!(f.coordinates(Dim::Height), vec![0.0, 1.0]);
    }

    #[test]
    fn lane_extraction() {
        let f = field();
        let lane = f.lane(Dim::Time, [0, 1, 2, 3]);
        assert_eq!(lane, vec![123.0, 1123.0, 2123.0, 3123.0]);
        let lane = f.lane(Dim::X, [2, 0, 1, 0]);
        assert_eq!(lane, vec![2010.0, 2011.0, 2012.0, 2013.0, 2014.0]);
    }

    #[test]
    fn derive_collapsed_time() {
        let f = field();
        let d = f.derive("uMean", Array4::zeros((1, 2, 3, 5))).unwrap();
        assert_eq!(d.times().len(), 1);
        assert_eq!(d.times()[0], f.times()[0]);
        assert_eq!(d.number_attr(DX), Some(30.0));
    }

    #[test]
    fn derive_rejects_bad_shape() {
        let f = field();
        let err = f.derive("bad", Array4::zeros((4, 2, 2, 5))).unwrap_err();
        assert!(matches!(err, FieldError::ShapeMismatch { .. }));
    }

    #[test]
    fn map_preserves_metadata() {
        let f = field();
        let g = f.map("u2", |v| v * 2.0);
        assert_eq!(g.data()[[1, 0, 0, 1]], 2002.0);
        assert_eq!(g.number_attr(DY), Some(40.0));
    }

    #[test]
    fn anomaly_broadcasts_mean() {
        let f = field();
        let mean = f.derive("uMean", Array4::from_elem((1, 2, 3, 5), 1000.0)).unwrap();
        let p = f.anomaly(&mean).unwrap();
        assert_eq!(p.name(), "uPert");
        assert_eq!(p.data()[[3, 1, 2, 4]], 3124.0 - 1000.0);

        let bad = Field::new("m", Array4::zeros((4, 2, 2, 5)), f.times().to_vec()).unwrap();
        assert!(matches!(f.anomaly(&bad), Err(FieldError::ShapeMismatch { .. })));
    }

    #[test]
    fn check_index() {
        let f = field();
        assert!(f.check_index(Dim::Y, 2).is_ok());
        assert!(matches!(
            f.check_index(Dim::Y, 3),
            Err(FieldError::IndexOutOfRange { index: 3, len: 3, .. })
        ));
    }
}
