//! Windowed covariance `mean(a b) - mean(a) mean(b)`.

use std::ops::Range;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use tracing::debug;

use crate::error::CovarianceError;
use crate::interval::Interval;
use crate::series::{LeveledSeries, Series, TimeSeries};

/// How the averaging windows are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CovarianceConfig {
    interval: Interval,
    resample: bool,
    centered: bool,
}

impl CovarianceConfig {
    /// Trailing rolling window of `interval`.
    pub fn new(interval: Interval) -> Self {
        Self {
            interval,
            resample: false,
            centered: false,
        }
    }

    /// Aggregates into fixed bins instead of a rolling window.
    pub fn with_resample(mut self, resample: bool) -> Self {
        self.resample = resample;
        self
    }

    /// Centres the rolling window on each sample.
    pub fn with_centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    /// Returns the window or bin width.
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Returns `true` for fixed-bin aggregation.
    pub fn resample(&self) -> bool {
        self.resample
    }

    /// Returns `true` for a centred rolling window.
    pub fn centered(&self) -> bool {
        self.centered
    }

    /// Rejects centring combined with resampling.
    pub fn validate(&self) -> Result<(), CovarianceError> {
        if self.resample && self.centered {
            return Err(CovarianceError::InvalidConfig {
                reason: "a centred window cannot be combined with resampling".into(),
            });
        }
        Ok(())
    }
}

/// Covariance of `a` and `b` over the configured windows.
///
/// - Rolling (default): one value per input sample. The trailing window at
///   `t` covers `(t - w, t]`, the centred one `[t - w/2, t + w/2)`.
/// - Resampled: one value per bin of width `w`, bins anchored at midnight
///   of the first timestamp and labelled by their left edge. Bins without
///   samples yield NaN.
///
/// NaN samples are skipped inside each mean. Leveled inputs are split per
/// level, processed independently, and stacked back sorted by
/// `(time, level)`.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`CovarianceError::InvalidConfig`] | centred window with resampling |
/// | [`CovarianceError::LevelStructure`] | exactly one input is leveled |
/// | [`CovarianceError::IndexMismatch`] | timestamps or levels differ between inputs |
#[tracing::instrument(skip_all, fields(interval = %config.interval(), resample = config.resample()))]
pub fn covariance(
    a: &Series,
    b: &Series,
    config: &CovarianceConfig,
) -> Result<Series, CovarianceError> {
    config.validate()?;
    match (a, b) {
        (Series::Single(a), Series::Single(b)) => Ok(Series::Single(single(a, b, config)?)),
        (Series::Leveled(a), Series::Leveled(b)) => {
            let pa = a.split();
            let pb = b.split();
            if pa.len() != pb.len() {
                return Err(CovarianceError::IndexMismatch {
                    reason: format!("{} levels vs {} levels", pa.len(), pb.len()),
                });
            }
            let mut parts = Vec::with_capacity(pa.len());
            for ((la, sa), (lb, sb)) in pa.iter().zip(&pb) {
                if la.total_cmp(lb).is_ne() {
                    return Err(CovarianceError::IndexMismatch {
                        reason: format!("level {la} vs level {lb}"),
                    });
                }
                debug!(level = *la, n = sa.len(), "level covariance");
                parts.push((*la, single(sa, sb, config)?));
            }
            Ok(Series::Leveled(LeveledSeries::stack(parts)))
        }
        _ => Err(CovarianceError::LevelStructure),
    }
}

/// Variance of `a`, identical to `covariance(a, a, config)`.
///
/// # Errors
///
/// As [`covariance`].
pub fn variance(a: &Series, config: &CovarianceConfig) -> Result<Series, CovarianceError> {
    covariance(a, a, config)
}

fn single(
    a: &TimeSeries,
    b: &TimeSeries,
    config: &CovarianceConfig,
) -> Result<TimeSeries, CovarianceError> {
    if a.times() != b.times() {
        return Err(CovarianceError::IndexMismatch {
            reason: format!(
                "timestamps differ ({} vs {} samples)",
                a.len(),
                b.len()
            ),
        });
    }
    let (times, windows) = if config.resample() {
        bins(a.times(), config.interval())
    } else {
        let windows = rolling(a.times(), config.interval(), config.centered());
        (a.times().to_vec(), windows)
    };

    let ab = a.product(b);
    let values = windows
        .iter()
        .map(|w| {
            let mean_ab = nan_mean(&ab[w.clone()]);
            let mean_a = nan_mean(&a.values()[w.clone()]);
            let mean_b = nan_mean(&b.values()[w.clone()]);
            mean_ab - mean_a * mean_b
        })
        .collect();
    TimeSeries::new(times, values)
}

/// Sample ranges of the rolling window ending at (or centred on) each sample.
fn rolling(times: &[NaiveDateTime], interval: Interval, centered: bool) -> Vec<Range<usize>> {
    let w = interval.delta();
    let mut windows = Vec::with_capacity(times.len());
    let mut start = 0;
    let mut end = 0;
    for (i, &t) in times.iter().enumerate() {
        if centered {
            let half = w / 2;
            while start < times.len() && times[start] < t - half {
                start += 1;
            }
            while end < times.len() && times[end] < t + half {
                end += 1;
            }
            // A zero-width half window still holds the sample itself.
            windows.push(start..end.max(i + 1));
        } else {
            while times[start] <= t - w {
                start += 1;
            }
            windows.push(start..i + 1);
        }
    }
    windows
}

/// Left-labelled bins of width `interval` and the samples in each.
fn bins(times: &[NaiveDateTime], interval: Interval) -> (Vec<NaiveDateTime>, Vec<Range<usize>>) {
    let (Some(&first), Some(&last)) = (times.first(), times.last()) else {
        return (Vec::new(), Vec::new());
    };
    let origin = first.date().and_time(NaiveTime::MIN);
    let width = interval.millis();
    let bin_of = |t: NaiveDateTime| (t - origin).num_milliseconds().div_euclid(width);
    let first_bin = bin_of(first);
    let last_bin = bin_of(last);

    let mut labels = Vec::new();
    let mut ranges = Vec::new();
    let mut start = 0;
    for k in first_bin..=last_bin {
        let mut end = start;
        while end < times.len() && bin_of(times[end]) == k {
            end += 1;
        }
        labels.push(origin + TimeDelta::milliseconds(k * width));
        ranges.push(start..end);
        start = end;
    }
    (labels, ranges)
}

/// Mean over non-NaN values; NaN if there are none.
fn nan_mean(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(s: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 11, 8)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + TimeDelta::seconds(s)
    }

    #[test]
    fn trailing_windows() {
        let times: Vec<_> = (0..5).map(|i| t(i * 10)).collect();
        let w = rolling(&times, Interval::new(TimeDelta::seconds(20)).unwrap(), false);
        assert_eq!(w, vec![0..1, 0..2, 1..3, 2..4, 3..5]);
    }

    #[test]
    fn centered_windows() {
        let times: Vec<_> = (0..5).map(|i| t(i * 10)).collect();
        let w = rolling(&times, Interval::new(TimeDelta::seconds(20)).unwrap(), true);
        // [t - 10, t + 10)
        assert_eq!(w, vec![0..1, 0..2, 1..3, 2..4, 3..5]);
        let w = rolling(&times, Interval::new(TimeDelta::seconds(30)).unwrap(), true);
        // [t - 15, t + 15)
        assert_eq!(w, vec![0..2, 0..3, 1..4, 2..5, 3..5]);
    }

    #[test]
    fn bins_anchor_at_midnight() {
        let times = vec![t(70), t(100), t(130), t(290)];
        let (labels, ranges) = bins(&times, Interval::minutes(1).unwrap());
        assert_eq!(labels, vec![t(60), t(120), t(180), t(240)]);
        assert_eq!(ranges, vec![0..2, 2..3, 3..3, 3..4]);
    }

    #[test]
    fn nan_mean_skips_nan() {
        assert_eq!(nan_mean(&[1.0, f64::NAN, 3.0]), 2.0);
        assert!(nan_mean(&[f64::NAN]).is_nan());
        assert!(nan_mean(&[]).is_nan());
    }
}
