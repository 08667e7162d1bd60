//! WRF `tslist` time-series output.
//!
//! WRF writes one text file per tower and variable, named
//! `<prefix>.d<domain>.<VAR>`. Profile files (`UU`, `VV`, `WW`, `TH`, `QV`,
//! `PH`, `PP`) carry a header line followed by rows of
//! `time_hours v1 .. vnz`. The surface file `TS` carries a parenthesised
//! station header and rows whose first two columns are bookkeeping.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use tracing::debug;

use crate::error::IoError;

// ---------------------------------------------------------------------------
// TowerHeader
// ---------------------------------------------------------------------------

/// Station metadata from the first line of a `TS` file.
///
/// The line reads
/// `NAME grid station ABBR (lat, lon) (i, j) (glat, glon) elevation meters`.
#[derive(Debug, Clone, PartialEq)]
pub struct TowerHeader {
    /// Long station name.
    pub name: String,
    /// Grid (domain) number.
    pub grid_id: u32,
    /// Station number within the list.
    pub station_id: u32,
    /// Short prefix used in file names.
    pub abbreviation: String,
    /// Requested latitude.
    pub lat: f64,
    /// Requested longitude.
    pub lon: f64,
    /// Zero-based west-east grid index.
    pub i: usize,
    /// Zero-based south-north grid index.
    pub j: usize,
    /// Latitude of the grid point used.
    pub grid_lat: f64,
    /// Longitude of the grid point used.
    pub grid_lon: f64,
    /// Terrain height of the grid point in metres.
    pub elevation: f64,
}

impl TowerHeader {
    /// Parses a header line.
    ///
    /// Parentheses and commas are treated as whitespace. WRF writes 1-based
    /// grid indices, which are converted to zero-based.
    pub fn parse(line: &str) -> Result<Self, String> {
        let cleaned: String = line
            .chars()
            .map(|c| if matches!(c, '(' | ')' | ',') { ' ' } else { c })
            .collect();
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();
        if tokens.len() < 11 {
            return Err(format!(
                "station header has {} fields, expected at least 11",
                tokens.len()
            ));
        }
        let number = |k: usize, what: &str| {
            tokens[k]
                .parse::<f64>()
                .map_err(|_| format!("invalid {what} '{}'", tokens[k]))
        };
        let index = |k: usize, what: &str| {
            let one_based = tokens[k]
                .parse::<usize>()
                .map_err(|_| format!("invalid {what} '{}'", tokens[k]))?;
            one_based
                .checked_sub(1)
                .ok_or_else(|| format!("{what} must be 1-based, got 0"))
        };
        let id = |k: usize, what: &str| {
            tokens[k]
                .parse::<u32>()
                .map_err(|_| format!("invalid {what} '{}'", tokens[k]))
        };
        Ok(Self {
            name: tokens[0].to_string(),
            grid_id: id(1, "grid id")?,
            station_id: id(2, "station id")?,
            abbreviation: tokens[3].to_string(),
            lat: number(4, "latitude")?,
            lon: number(5, "longitude")?,
            i: index(6, "i index")?,
            j: index(7, "j index")?,
            grid_lat: number(8, "grid latitude")?,
            grid_lon: number(9, "grid longitude")?,
            elevation: number(10, "elevation")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// One profile file: a time column in hours and an `(nt, nz)` value table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTable {
    /// Model hours since the start of the run.
    pub hours: Vec<f64>,
    /// Values, one row per time and one column per level.
    pub values: Array2<f64>,
}

impl ProfileTable {
    /// Number of levels.
    pub fn levels(&self) -> usize {
        self.values.ncols()
    }
}

/// The `TS` surface file: station header plus an `(nt, nvar)` table.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceTable {
    /// Station metadata.
    pub header: TowerHeader,
    /// Surface variables, one row per time. The two leading bookkeeping
    /// columns of each row are dropped.
    pub values: Array2<f64>,
}

/// An entry of the `tslist` station list.
#[derive(Debug, Clone, PartialEq)]
pub struct StationEntry {
    /// Station name or description.
    pub name: String,
    /// Location pair as written: latitude/longitude or i/j.
    pub location: [f64; 2],
}

fn read_text(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_row(path: &Path, line: usize, text: &str) -> Result<Vec<f64>, IoError> {
    text.split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| IoError::Parse {
                path: path.to_path_buf(),
                line,
                reason: format!("invalid number '{tok}'"),
            })
        })
        .collect()
}

/// Parses rows after the header, each with the same width, skipping the
/// first `skip` columns. Blank lines are ignored.
fn read_rows(path: &Path, text: &str, skip: usize) -> Result<(Vec<f64>, Array2<f64>), IoError> {
    let mut leading = Vec::new();
    let mut flat = Vec::new();
    let mut width = None;
    for (k, raw) in text.lines().enumerate().skip(1) {
        if raw.trim().is_empty() {
            continue;
        }
        let line = k + 1;
        let row = parse_row(path, line, raw)?;
        if row.len() <= skip {
            return Err(IoError::Parse {
                path: path.to_path_buf(),
                line,
                reason: format!("expected more than {skip} columns, found {}", row.len()),
            });
        }
        let n = row.len() - skip;
        match width {
            None => width = Some(n),
            Some(w) if w != n => {
                return Err(IoError::Parse {
                    path: path.to_path_buf(),
                    line,
                    reason: format!("expected {w} values, found {n}"),
                });
            }
            Some(_) => {}
        }
        leading.push(row[0]);
        flat.extend_from_slice(&row[skip..]);
    }
    let nt = leading.len();
    let values = Array2::from_shape_vec((nt, width.unwrap_or(0)), flat).map_err(|e| {
        IoError::Parse {
            path: path.to_path_buf(),
            line: 1,
            reason: e.to_string(),
        }
    })?;
    Ok((leading, values))
}

/// Reads a profile file such as `T1.d02.UU`.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`IoError::FileNotFound`] | `path` does not exist |
/// | [`IoError::Read`] | the file cannot be read |
/// | [`IoError::Parse`] | a value is not a number or a row has the wrong width |
pub fn read_profile(path: &Path) -> Result<ProfileTable, IoError> {
    let text = read_text(path)?;
    let (hours, values) = read_rows(path, &text, 1)?;
    debug!(path = %path.display(), nt = hours.len(), nz = values.ncols(), "profile read");
    Ok(ProfileTable { hours, values })
}

/// Reads the surface file `<prefix>.TS`.
///
/// # Errors
///
/// As [`read_profile`], plus [`IoError::Parse`] for a malformed header.
pub fn read_surface(path: &Path) -> Result<SurfaceTable, IoError> {
    let text = read_text(path)?;
    let first = text.lines().next().unwrap_or("");
    let header = TowerHeader::parse(first).map_err(|reason| IoError::Parse {
        path: path.to_path_buf(),
        line: 1,
        reason,
    })?;
    let (_, values) = read_rows(path, &text, 2)?;
    debug!(path = %path.display(), station = %header.abbreviation, nt = values.nrows(), "surface read");
    Ok(SurfaceTable { header, values })
}

/// Reads the `tslist` station list: three header lines, then one station
/// per line with its name in the second column and a location pair in the
/// third and fourth.
///
/// # Errors
///
/// As [`read_profile`].
pub fn read_station_list(path: &Path) -> Result<Vec<StationEntry>, IoError> {
    let text = read_text(path)?;
    let mut entries = Vec::new();
    for (k, raw) in text.lines().enumerate().skip(3) {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let parse_err = |reason: String| IoError::Parse {
            path: path.to_path_buf(),
            line: k + 1,
            reason,
        };
        if tokens.len() < 4 {
            return Err(parse_err(format!(
                "expected at least 4 columns, found {}",
                tokens.len()
            )));
        }
        let mut location = [0.0; 2];
        for (slot, tok) in location.iter_mut().zip(&tokens[2..4]) {
            *slot = tok
                .parse()
                .map_err(|_| parse_err(format!("invalid number '{tok}'")))?;
        }
        entries.push(StationEntry {
            name: tokens[1].to_string(),
            location,
        });
    }
    Ok(entries)
}

/// Path of the file holding `var` for the tower at `prefix`.
pub fn variable_path(prefix: &Path, var: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(".");
    name.push(var);
    PathBuf::from(name)
}
