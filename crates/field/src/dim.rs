//! Named axes of a 4-D field.

use std::fmt;
use std::str::FromStr;

use ndarray::Axis;

use crate::error::FieldError;

/// One of the four axes of a [`Field`](crate::Field).
///
/// Data is always stored in canonical `(time, height, y, x)` order, so every
/// dimension maps to a fixed array axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dim {
    /// Time (WRF `Time`, mmc `datetime`).
    Time,
    /// Vertical level index (WRF `bottom_top`).
    Height,
    /// South-north index (WRF `south_north`).
    Y,
    /// West-east index (WRF `west_east`).
    X,
}

impl Dim {
    /// All dimensions in canonical storage order.
    pub const ALL: [Dim; 4] = [Dim::Time, Dim::Height, Dim::Y, Dim::X];

    /// Position of this dimension in the canonical storage order.
    pub fn index(self) -> usize {
        match self {
            Dim::Time => 0,
            Dim::Height => 1,
            Dim::Y => 2,
            Dim::X => 3,
        }
    }

    /// The `ndarray` axis for this dimension.
    pub fn axis(self) -> Axis {
        Axis(self.index())
    }

    /// Canonical lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            Dim::Time => "time",
            Dim::Height => "height",
            Dim::Y => "y",
            Dim::X => "x",
        }
    }

    /// Returns `true` for the two horizontal dimensions.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Dim::Y | Dim::X)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dim {
    type Err = FieldError;

    /// Parses a dimension name, accepting WRF and mmc-standard aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "time" | "times" | "datetime" | "t" => Ok(Dim::Time),
            "height" | "bottom_top" | "nz" | "z" | "level" => Ok(Dim::Height),
            "y" | "ny" | "south_north" => Ok(Dim::Y),
            "x" | "nx" | "west_east" => Ok(Dim::X),
            _ => Err(FieldError::UnknownDimension {
                name: s.to_string(),
            }),
        }
    }
}
