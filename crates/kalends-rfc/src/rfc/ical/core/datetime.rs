//! iCalendar DATE-TIME, TIME and UTC-OFFSET value types (RFC 5545 §3.3.5,
//! §3.3.12, §3.3.14).

use std::fmt;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// UTC offset representation (e.g., +0530, -0800, +053045).
///
/// Stored as total seconds from UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtcOffset {
    /// Total seconds from UTC (positive = east, negative = west).
    seconds: i32,
}

impl UtcOffset {
    /// UTC offset (zero).
    pub const UTC: Self = Self { seconds: 0 };

    /// Creates a UTC offset from total seconds.
    #[must_use]
    pub const fn from_seconds(seconds: i32) -> Self {
        Self { seconds }
    }

    /// Returns the offset as total seconds from UTC.
    #[must_use]
    pub const fn as_seconds(self) -> i32 {
        self.seconds
    }

    /// Returns the offset as a chrono time delta.
    #[must_use]
    pub fn as_delta(self) -> chrono::TimeDelta {
        chrono::TimeDelta::seconds(i64::from(self.seconds))
    }

    /// Returns the offset as a chrono fixed offset, if representable.
    #[must_use]
    pub fn as_fixed(self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.seconds)
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.seconds >= 0 { '+' } else { '-' };
        let total = self.seconds.abs();
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        if seconds == 0 {
            write!(f, "{sign}{hours:02}{minutes:02}")
        } else {
            write!(f, "{sign}{hours:02}{minutes:02}{seconds:02}")
        }
    }
}

/// Form of a DATE-TIME or TIME value (RFC 5545 §3.3.5).
///
/// iCalendar DATE-TIME values come in three mutually exclusive forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DateTimeForm {
    /// Floating time - same wall-clock time in any timezone.
    ///
    /// Example: `19980118T230000`
    #[default]
    Floating,

    /// UTC time - absolute instant, indicated by 'Z' suffix.
    ///
    /// Example: `19980119T070000Z`
    Utc,

    /// Zoned time - local time with TZID reference.
    ///
    /// Example: `TZID=America/New_York:19980119T020000`
    Zoned {
        /// The timezone identifier, resolved through the calendar's table.
        tzid: String,
    },
}

impl DateTimeForm {
    /// Returns the TZID if this form is zoned.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::Zoned { tzid } => Some(tzid),
            Self::Floating | Self::Utc => None,
        }
    }
}

/// DATE-TIME value (RFC 5545 §3.3.5).
///
/// The wall-clock value is kept as a chrono `NaiveDateTime`; the form says how
/// to anchor it. A parsed `:60` second is stored as 59 with `leap_second` set
/// so it can be written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateTime {
    /// Wall-clock date and time.
    pub local: NaiveDateTime,
    /// The form of this DATE-TIME (floating, UTC, or zoned).
    pub form: DateTimeForm,
    /// Whether the source text carried a leap second (`60`).
    pub leap_second: bool,
}

impl DateTime {
    /// Creates a floating DATE-TIME.
    #[must_use]
    pub const fn floating(local: NaiveDateTime) -> Self {
        Self {
            local,
            form: DateTimeForm::Floating,
            leap_second: false,
        }
    }

    /// Creates a UTC DATE-TIME.
    #[must_use]
    pub const fn utc(local: NaiveDateTime) -> Self {
        Self {
            local,
            form: DateTimeForm::Utc,
            leap_second: false,
        }
    }

    /// Creates a zoned DATE-TIME.
    #[must_use]
    pub fn zoned(local: NaiveDateTime, tzid: impl Into<String>) -> Self {
        Self {
            local,
            form: DateTimeForm::Zoned { tzid: tzid.into() },
            leap_second: false,
        }
    }

    /// Returns a copy carrying another wall-clock value in the same form.
    ///
    /// The leap-second flag is not carried over.
    #[must_use]
    pub fn with_local(&self, local: NaiveDateTime) -> Self {
        Self {
            local,
            form: self.form.clone(),
            leap_second: false,
        }
    }

    /// Returns true if this is a UTC time.
    #[must_use]
    pub const fn is_utc(&self) -> bool {
        matches!(self.form, DateTimeForm::Utc)
    }

    /// Returns true if this is a floating time.
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        matches!(self.form, DateTimeForm::Floating)
    }

    /// Returns the TZID if this is a zoned time.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.form.tzid()
    }

    /// Returns the calendar date part.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.local.date()
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let second = if self.leap_second {
            60
        } else {
            self.local.second()
        };
        write!(
            f,
            "{}T{:02}{:02}{second:02}",
            self.local.format("%Y%m%d"),
            self.local.hour(),
            self.local.minute(),
        )?;
        if self.is_utc() {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

/// Time value (RFC 5545 §3.3.12).
///
/// Represents a time of day; shares the form and leap-second handling of
/// DATE-TIME.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Time {
    /// Wall-clock time.
    pub local: NaiveTime,
    /// Floating, UTC or zoned.
    pub form: DateTimeForm,
    /// Whether the source text carried a leap second (`60`).
    pub leap_second: bool,
}

impl Time {
    /// Creates a local (floating) time.
    #[must_use]
    pub const fn floating(local: NaiveTime) -> Self {
        Self {
            local,
            form: DateTimeForm::Floating,
            leap_second: false,
        }
    }

    /// Creates a UTC time.
    #[must_use]
    pub const fn utc(local: NaiveTime) -> Self {
        Self {
            local,
            form: DateTimeForm::Utc,
            leap_second: false,
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let second = if self.leap_second {
            60
        } else {
            self.local.second()
        };
        write!(
            f,
            "{:02}{:02}{second:02}",
            self.local.hour(),
            self.local.minute()
        )?;
        if matches!(self.form, DateTimeForm::Utc) {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

/// Formats a DATE value (RFC 5545 §3.3.4).
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, s))
            .expect("valid test date")
    }

    #[test]
    fn utc_offset_display() {
        assert_eq!(UtcOffset::from_seconds(19_800).to_string(), "+0530");
        assert_eq!(UtcOffset::from_seconds(-28_800).to_string(), "-0800");
        assert_eq!(UtcOffset::from_seconds(3_661).to_string(), "+010101");
        assert_eq!(UtcOffset::UTC.to_string(), "+0000");
    }

    #[test]
    fn datetime_display_forms() {
        let local = naive(2026, 1, 23, 12, 0, 0);
        assert_eq!(DateTime::floating(local).to_string(), "20260123T120000");
        assert_eq!(DateTime::utc(local).to_string(), "20260123T120000Z");
        let zoned = DateTime::zoned(local, "America/New_York");
        assert_eq!(zoned.to_string(), "20260123T120000");
        assert_eq!(zoned.tzid(), Some("America/New_York"));
    }

    #[test]
    fn leap_second_is_written_back() {
        let mut dt = DateTime::utc(naive(1998, 12, 31, 23, 59, 59));
        dt.leap_second = true;
        assert_eq!(dt.to_string(), "19981231T235960Z");
        assert!(!dt.with_local(dt.local).leap_second);
    }

    #[test]
    fn time_display() {
        let t = NaiveTime::from_hms_opt(7, 30, 0).expect("valid time");
        assert_eq!(Time::floating(t).to_string(), "073000");
        assert_eq!(Time::utc(t).to_string(), "073000Z");
    }
}
