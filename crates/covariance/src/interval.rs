//! Offset strings such as `"10min"` or `"30s"`.

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;

use crate::error::CovarianceError;

/// A positive window or bin width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval(TimeDelta);

impl Interval {
    /// Wraps a duration.
    ///
    /// # Errors
    ///
    /// Returns [`CovarianceError::InvalidInterval`] if `delta` is not positive.
    pub fn new(delta: TimeDelta) -> Result<Self, CovarianceError> {
        if delta <= TimeDelta::zero() {
            return Err(CovarianceError::InvalidInterval {
                text: delta.to_string(),
                reason: "must be positive".into(),
            });
        }
        Ok(Self(delta))
    }

    /// Interval of whole minutes.
    pub fn minutes(n: i64) -> Result<Self, CovarianceError> {
        Self::new(TimeDelta::minutes(n))
    }

    /// Returns the duration.
    pub fn delta(&self) -> TimeDelta {
        self.0
    }

    /// Returns the duration in milliseconds.
    pub fn millis(&self) -> i64 {
        self.0.num_milliseconds()
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self(TimeDelta::minutes(10))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.millis();
        let units = [
            (86_400_000, "D"),
            (3_600_000, "h"),
            (60_000, "min"),
            (1_000, "s"),
        ];
        for (size, unit) in units {
            if ms % size == 0 {
                return write!(f, "{}{unit}", ms / size);
            }
        }
        write!(f, "{ms}ms")
    }
}

impl FromStr for Interval {
    type Err = CovarianceError;

    /// Parses `<count><unit>`, the count defaulting to 1.
    ///
    /// Units: `D`/`d`/`day`, `H`/`h`, `min`/`T`, `S`/`s`, `ms`/`L`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CovarianceError::InvalidInterval {
            text: s.into(),
            reason: reason.into(),
        };
        let text = s.trim();
        let split = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        let (count, unit) = text.split_at(split);
        let count: i64 = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|_| invalid("count out of range"))?
        };
        let delta = match unit.trim() {
            "D" | "d" | "day" | "days" => TimeDelta::try_days(count),
            "H" | "h" | "hour" | "hours" => TimeDelta::try_hours(count),
            "min" | "T" | "m" => TimeDelta::try_minutes(count),
            "S" | "s" | "sec" => TimeDelta::try_seconds(count),
            "ms" | "L" => TimeDelta::try_milliseconds(count),
            "" => return Err(invalid("missing unit")),
            _ => return Err(invalid("unknown unit")),
        }
        .ok_or_else(|| invalid("count out of range"))?;
        if delta <= TimeDelta::zero() {
            return Err(invalid("must be positive"));
        }
        Ok(Self(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_offsets() {
        assert_eq!("10min".parse::<Interval>().unwrap().delta(), TimeDelta::minutes(10));
        assert_eq!("10T".parse::<Interval>().unwrap().delta(), TimeDelta::minutes(10));
        assert_eq!("30s".parse::<Interval>().unwrap().delta(), TimeDelta::seconds(30));
        assert_eq!("H".parse::<Interval>().unwrap().delta(), TimeDelta::hours(1));
        assert_eq!("2D".parse::<Interval>().unwrap().delta(), TimeDelta::days(2));
        assert_eq!("500ms".parse::<Interval>().unwrap().millis(), 500);
        assert_eq!(" 5 min ".parse::<Interval>().unwrap().delta(), TimeDelta::minutes(5));
    }

    #[test]
    fn reject_bad_offsets() {
        for text in ["", "10", "10 parsecs", "0min", "-5s", "1.5h"] {
            let err = text.parse::<Interval>().unwrap_err();
            assert!(matches!(err, CovarianceError::InvalidInterval { .. }), "{text}");
        }
    }

    #[test]
    fn display_round_trips() {
        for text in ["10min", "30s", "1h", "2D", "250ms"] {
            let iv: Interval = text.parse().unwrap();
            assert_eq!(iv.to_string(), text);
        }
    }
}
