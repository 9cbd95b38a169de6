//! iCalendar DURATION value type (RFC 5545 §3.3.6).

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Duration value (RFC 5545 §3.3.6).
///
/// Either week-based (`P1W`) or day/time-based (`P1DT2H30M`). Weeks and days
/// are nominal: they move the wall clock by whole days. Hours, minutes and
/// seconds are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Duration {
    /// Whether this duration is negative.
    pub negative: bool,
    /// Number of weeks (mutually exclusive with days/hours/minutes/seconds).
    pub weeks: u32,
    /// Number of days.
    pub days: u32,
    /// Number of hours.
    pub hours: u32,
    /// Number of minutes.
    pub minutes: u32,
    /// Number of seconds.
    pub seconds: u32,
}

impl Duration {
    /// Creates a zero duration.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            negative: false,
            weeks: 0,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }

    /// Creates a duration from weeks.
    #[must_use]
    pub const fn weeks(weeks: u32) -> Self {
        Self {
            weeks,
            ..Self::zero()
        }
    }

    /// Creates a duration from days.
    #[must_use]
    pub const fn days(days: u32) -> Self {
        Self {
            days,
            ..Self::zero()
        }
    }

    /// Creates a duration from hours, minutes and seconds.
    #[must_use]
    pub const fn hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            ..Self::zero()
        }
    }

    /// Negates this duration.
    #[must_use]
    pub const fn negate(mut self) -> Self {
        self.negative = !self.negative;
        self
    }

    /// Builds a day/time duration from a chrono delta.
    ///
    /// Whole days become the day designator; the remainder becomes H/M/S.
    #[must_use]
    pub fn from_delta(delta: TimeDelta) -> Self {
        let negative = delta < TimeDelta::zero();
        let total = delta.num_seconds().unsigned_abs();
        let clamp = |v: u64| u32::try_from(v).unwrap_or(u32::MAX);
        Self {
            negative,
            weeks: 0,
            days: clamp(total / 86_400),
            hours: clamp((total % 86_400) / 3_600),
            minutes: clamp((total % 3_600) / 60),
            seconds: clamp(total % 60),
        }
    }

    /// Returns true if the duration has no time-of-day part.
    #[must_use]
    pub const fn is_whole_days(&self) -> bool {
        self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }

    /// Returns true if the duration is zero or negative.
    #[must_use]
    pub const fn is_non_positive(&self) -> bool {
        self.negative || self.as_seconds() == 0
    }

    /// Returns the total duration as seconds, counting a day as 86400 seconds.
    #[must_use]
    pub const fn as_seconds(&self) -> i64 {
        let total = (self.weeks as i64 * 7 * 86_400)
            + (self.days as i64 * 86_400)
            + (self.hours as i64 * 3_600)
            + (self.minutes as i64 * 60)
            + (self.seconds as i64);

        if self.negative { -total } else { total }
    }

    fn signed(&self, value: i64) -> i64 {
        if self.negative { -value } else { value }
    }

    /// Adds this duration to a wall-clock value.
    ///
    /// Returns `None` when the result is out of chrono's range.
    #[must_use]
    pub fn add_to(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        let days = self.signed(i64::from(self.weeks) * 7 + i64::from(self.days));
        let exact = self.signed(
            i64::from(self.hours) * 3_600 + i64::from(self.minutes) * 60 + i64::from(self.seconds),
        );
        local
            .checked_add_signed(TimeDelta::try_days(days)?)?
            .checked_add_signed(TimeDelta::try_seconds(exact)?)
    }

    /// Adds the day part of this duration to a date.
    #[must_use]
    pub fn add_to_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let days = self.signed(i64::from(self.weeks) * 7 + i64::from(self.days));
        date.checked_add_signed(TimeDelta::try_days(days)?)
    }

    /// Returns this duration multiplied by `factor`.
    #[must_use]
    pub fn times(&self, factor: u32) -> Self {
        Self {
            negative: self.negative,
            weeks: self.weeks.saturating_mul(factor),
            days: self.days.saturating_mul(factor),
            hours: self.hours.saturating_mul(factor),
            minutes: self.minutes.saturating_mul(factor),
            seconds: self.seconds.saturating_mul(factor),
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;

        if self.weeks > 0 {
            return write!(f, "{}W", self.weeks);
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.is_whole_days() {
            if self.days == 0 {
                write!(f, "0D")?;
            }
            return Ok(());
        }
        write!(f, "T")?;
        if self.hours > 0 {
            write!(f, "{}H", self.hours)?;
        }
        if self.minutes > 0 {
            write!(f, "{}M", self.minutes)?;
        }
        if self.seconds > 0 {
            write!(f, "{}S", self.seconds)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    #[test]
    fn duration_display() {
        assert_eq!(Duration::weeks(2).to_string(), "P2W");
        assert_eq!(
            Duration {
                days: 1,
                hours: 2,
                minutes: 30,
                ..Duration::zero()
            }
            .to_string(),
            "P1DT2H30M"
        );
        assert_eq!(Duration::hms(0, 15, 0).negate().to_string(), "-PT15M");
        assert_eq!(Duration::zero().to_string(), "P0D");
        assert_eq!(Duration::days(3).to_string(), "P3D");
    }

    #[test]
    fn duration_from_delta() {
        let d = Duration::from_delta(TimeDelta::seconds(90_061));
        assert_eq!(d.to_string(), "P1DT1H1M1S");
        let d = Duration::from_delta(TimeDelta::hours(-2));
        assert_eq!(d.to_string(), "-PT2H");
    }

    #[test]
    fn duration_add_to() {
        let d = Duration {
            days: 1,
            hours: 2,
            ..Duration::zero()
        };
        assert_eq!(d.add_to(at(2024, 2, 28, 23)), Some(at(2024, 3, 1, 1)));
        assert_eq!(d.negate().add_to(at(2024, 3, 1, 1)), Some(at(2024, 2, 28, 23)));
    }

    #[test]
    fn duration_times_and_sign() {
        assert_eq!(Duration::hms(0, 15, 0).times(3).as_seconds(), 45 * 60);
        assert!(Duration::zero().is_non_positive());
        assert!(Duration::days(1).negate().is_non_positive());
        assert!(!Duration::days(1).is_non_positive());
    }
}
