//! Timestamped series, with or without a secondary level index.

use chrono::NaiveDateTime;

use crate::error::CovarianceError;

/// A series indexed by non-decreasing timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    times: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Creates a series.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CovarianceError::LengthMismatch`] | `times` and `values` differ in length |
    /// | [`CovarianceError::Unsorted`] | timestamps decrease |
    pub fn new(times: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self, CovarianceError> {
        if times.len() != values.len() {
            return Err(CovarianceError::LengthMismatch {
                times: times.len(),
                other: values.len(),
            });
        }
        if let Some(i) = times.windows(2).position(|w| w[1] < w[0]) {
            return Err(CovarianceError::Unsorted { index: i + 1 });
        }
        Ok(Self { times, values })
    }

    /// Returns the timestamps.
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Returns the values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the series has no samples.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pointwise product with a series on the same timestamps.
    pub(crate) fn product(&self, other: &TimeSeries) -> Vec<f64> {
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .collect()
    }
}

/// Rows of `(time, level, value)`, e.g. a tower profile stacked by height.
#[derive(Debug, Clone, PartialEq)]
pub struct LeveledSeries {
    times: Vec<NaiveDateTime>,
    levels: Vec<f64>,
    values: Vec<f64>,
}

impl LeveledSeries {
    /// Creates a leveled series from parallel columns, in any row order.
    ///
    /// # Errors
    ///
    /// Returns [`CovarianceError::LengthMismatch`] if the columns differ in
    /// length.
    pub fn new(
        times: Vec<NaiveDateTime>,
        levels: Vec<f64>,
        values: Vec<f64>,
    ) -> Result<Self, CovarianceError> {
        for other in [levels.len(), values.len()] {
            if other != times.len() {
                return Err(CovarianceError::LengthMismatch {
                    times: times.len(),
                    other,
                });
            }
        }
        Ok(Self {
            times,
            levels,
            values,
        })
    }

    /// Returns the time column.
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Returns the level column.
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Returns the value column.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Distinct levels in ascending order.
    pub fn distinct_levels(&self) -> Vec<f64> {
        let mut levels = self.levels.clone();
        levels.sort_by(f64::total_cmp);
        levels.dedup_by(|a, b| a.total_cmp(b).is_eq());
        levels
    }

    /// Splits into one time-sorted series per level, levels ascending.
    pub fn split(&self) -> Vec<(f64, TimeSeries)> {
        self.distinct_levels()
            .into_iter()
            .map(|level| {
                let mut rows: Vec<(NaiveDateTime, f64)> = (0..self.len())
                    .filter(|&i| self.levels[i].total_cmp(&level).is_eq())
                    .map(|i| (self.times[i], self.values[i]))
                    .collect();
                rows.sort_by_key(|&(t, _)| t);
                let (times, values) = rows.into_iter().unzip();
                (level, TimeSeries { times, values })
            })
            .collect()
    }

    /// Stacks per-level series into rows sorted by `(time, level)`.
    pub fn stack(parts: Vec<(f64, TimeSeries)>) -> Self {
        let mut rows: Vec<(NaiveDateTime, f64, f64)> = parts
            .into_iter()
            .flat_map(|(level, s)| {
                s.times
                    .into_iter()
                    .zip(s.values)
                    .map(move |(t, v)| (t, level, v))
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
        let mut out = Self {
            times: Vec::with_capacity(rows.len()),
            levels: Vec::with_capacity(rows.len()),
            values: Vec::with_capacity(rows.len()),
        };
        for (t, level, v) in rows {
            out.times.push(t);
            out.levels.push(level);
            out.values.push(v);
        }
        out
    }
}

/// Covariance input or output.
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    /// One time series.
    Single(TimeSeries),
    /// Several levels stacked as rows.
    Leveled(LeveledSeries),
}

impl Series {
    /// Returns the single series, if this is one.
    pub fn as_single(&self) -> Option<&TimeSeries> {
        match self {
            Series::Single(s) => Some(s),
            Series::Leveled(_) => None,
        }
    }

    /// Returns the leveled series, if this is one.
    pub fn as_leveled(&self) -> Option<&LeveledSeries> {
        match self {
            Series::Leveled(s) => Some(s),
            Series::Single(_) => None,
        }
    }

    /// Number of samples or rows.
    pub fn len(&self) -> usize {
        match self {
            Series::Single(s) => s.len(),
            Series::Leveled(s) => s.len(),
        }
    }

    /// Returns `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<TimeSeries> for Series {
    fn from(s: TimeSeries) -> Self {
        Series::Single(s)
    }
}

impl From<LeveledSeries> for Series {
    fn from(s: LeveledSeries) -> Self {
        Series::Leveled(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn t(s: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 11, 8)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + TimeDelta::seconds(s)
    }

    #[test]
    fn time_series_checks() {
        assert!(matches!(
            TimeSeries::new(vec![t(0), t(1)], vec![1.0]),
            Err(CovarianceError::LengthMismatch { times: 2, other: 1 })
        ));
        assert!(matches!(
            TimeSeries::new(vec![t(0), t(2), t(1)], vec![1.0; 3]),
            Err(CovarianceError::Unsorted { index: 2 })
        ));
        assert!(TimeSeries::new(vec![t(0), t(0), t(1)], vec![1.0; 3]).is_ok());
    }

    #[test]
    fn split_and_stack() {
        let s = LeveledSeries::new(
            vec![t(1), t(0), t(0), t(1)],
            vec![80.0, 80.0, 10.0, 10.0],
            vec![4.0, 3.0, 1.0, 2.0],
        )
        .unwrap();
        let parts = s.split();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].0, 10.0);
        assert_eq!(parts[0].1.values(), &[1.0, 2.0]);
        assert_eq!(parts[1].1.times(), &[t(0), t(1)]);

        let stacked = LeveledSeries::stack(parts);
        assert_eq!(stacked.times(), &[t(0), t(0), t(1), t(1)]);
        assert_eq!(stacked.levels(), &[10.0, 80.0, 10.0, 80.0]);
        assert_eq!(stacked.values(), &[1.0, 3.0, 2.0, 4.0]);
    }
}
