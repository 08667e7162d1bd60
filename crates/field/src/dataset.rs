//! Dataset capability trait and the in-memory [`FieldSet`].

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::dim::Dim;
use crate::error::FieldError;
use crate::field::{Attribute, Field};

/// The source a dataset was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// Gridded atmospheric model output.
    ModelGrid,
    /// Tower observation (or model virtual tower) time series.
    Tower,
}

impl DatasetKind {
    /// Lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::ModelGrid => "model_grid",
            DatasetKind::Tower => "tower",
        }
    }
}

/// Read access to named fields, attributes and dimensions.
///
/// The statistics engine only sees this trait and never the file format
/// behind it.
pub trait Dataset {
    /// Returns which kind of source this is.
    fn kind(&self) -> DatasetKind;

    /// Returns the field named `name`, if present.
    fn variable(&self, name: &str) -> Option<&Field>;

    /// Returns the names of all fields.
    fn variable_names(&self) -> Vec<String>;

    /// Returns a dataset-level attribute.
    fn attribute(&self, key: &str) -> Option<&Attribute>;

    /// Returns the shared timestamps.
    fn times(&self) -> &[NaiveDateTime];

    /// Returns the length of `dim`, or `None` for an empty dataset.
    fn dim_len(&self, dim: Dim) -> Option<usize>;

    /// Returns the field named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::MissingVariable`] if it is absent.
    fn require(&self, name: &str) -> Result<&Field, FieldError> {
        self.variable(name)
            .ok_or_else(|| FieldError::MissingVariable { name: name.into() })
    }
}

/// An in-memory collection of equally shaped fields.
///
/// All members share shape and timestamps. Dataset attributes (grid
/// spacing, station metadata) are copied into each inserted field that does
/// not set them itself.
#[derive(Clone, Debug)]
pub struct FieldSet {
    kind: DatasetKind,
    fields: BTreeMap<String, Field>,
    attrs: BTreeMap<String, Attribute>,
    times: Vec<NaiveDateTime>,
    shape: Option<[usize; 4]>,
}

impl FieldSet {
    /// Creates an empty set.
    pub fn new(kind: DatasetKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
            attrs: BTreeMap::new(),
            times: Vec::new(),
            shape: None,
        }
    }

    /// Sets a dataset attribute. Applies to fields inserted afterwards.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Attribute>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Adds a field, replacing any field with the same name.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`FieldError::ShapeMismatch`] | shape differs from existing members |
    /// | [`FieldError::TimeAxisMismatch`] | timestamps differ from existing members |
    pub fn insert(&mut self, field: Field) -> Result<(), FieldError> {
        let shape = field.shape();
        match self.shape {
            Some(expected) if expected != shape => {
                return Err(FieldError::ShapeMismatch {
                    expected,
                    got: shape,
                });
            }
            Some(_) if self.times != field.times() => {
                return Err(FieldError::TimeAxisMismatch {
                    times: field.times().len(),
                    len: self.times.len(),
                });
            }
            Some(_) => {}
            None => {
                self.shape = Some(shape);
                self.times = field.times().to_vec();
            }
        }
        let field = field.with_default_attrs(&self.attrs);
        self.fields.insert(field.name().to_string(), field);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_field(mut self, field: Field) -> Result<Self, FieldError> {
        self.insert(field)?;
        Ok(self)
    }

    /// Returns the common shape, if any field has been inserted.
    pub fn shape(&self) -> Option<[usize; 4]> {
        self.shape
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field has been inserted.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Dataset for FieldSet {
    fn kind(&self) -> DatasetKind {
        self.kind
    }

    fn variable(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    fn variable_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.attrs.get(key)
    }

    fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    fn dim_len(&self, dim: Dim) -> Option<usize> {
        self.shape.map(|s| s[dim.index()])
    }
}
