//! iCalendar RECUR value type (RFC 5545 §3.3.10).
//!
//! A [`Recur`] keeps its rule parts in the order they were written so that a
//! parsed rule serializes back to the same text. Typed accessors give the
//! expander the values it needs.

use std::fmt;

use chrono::NaiveDate;

use super::DateTime;
use super::datetime::format_date;

/// Recurrence frequency (RFC 5545 §3.3.10).
///
/// Variants are ordered from finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day of the week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Returns the two-letter abbreviation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
            Self::Sunday => "SU",
        }
    }

    /// Parses a weekday from a two-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            "SU" => Self::Sunday,
            _ => return None,
        })
    }

    /// Converts to chrono's weekday.
    #[must_use]
    pub const fn to_chrono(self) -> chrono::Weekday {
        match self {
            Self::Monday => chrono::Weekday::Mon,
            Self::Tuesday => chrono::Weekday::Tue,
            Self::Wednesday => chrono::Weekday::Wed,
            Self::Thursday => chrono::Weekday::Thu,
            Self::Friday => chrono::Weekday::Fri,
            Self::Saturday => chrono::Weekday::Sat,
            Self::Sunday => chrono::Weekday::Sun,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weekday with optional occurrence number, as used in BYDAY.
///
/// `MO` is every Monday, `1MO` the first Monday and `-1FR` the last Friday of
/// the enclosing month or year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayNum {
    /// Optional occurrence number (non-zero).
    pub ordinal: Option<i16>,
    /// The day of the week.
    pub weekday: Weekday,
}

impl WeekdayNum {
    /// Creates a weekday occurrence without an ordinal.
    #[must_use]
    pub const fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// Creates a weekday occurrence with an ordinal.
    #[must_use]
    pub const fn nth(ordinal: i16, weekday: Weekday) -> Self {
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

/// UNTIL value - either DATE or DATE-TIME.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecurUntil {
    /// Date-only boundary (inclusive).
    Date(NaiveDate),
    /// Date-time boundary (inclusive).
    DateTime(DateTime),
}

impl fmt::Display for RecurUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => f.write_str(&format_date(*d)),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// One `NAME=VALUE` part of a recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RulePart {
    Freq(Frequency),
    Until(RecurUntil),
    Count(u32),
    Interval(u32),
    BySecond(Vec<u8>),
    ByMinute(Vec<u8>),
    ByHour(Vec<u8>),
    ByDay(Vec<WeekdayNum>),
    ByMonthDay(Vec<i16>),
    ByYearDay(Vec<i16>),
    ByWeekNo(Vec<i16>),
    ByMonth(Vec<u8>),
    BySetPos(Vec<i16>),
    Wkst(Weekday),
    /// Unrecognised part, kept verbatim.
    Other { name: String, value: String },
}

impl RulePart {
    /// Returns the rule-part name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Freq(_) => "FREQ",
            Self::Until(_) => "UNTIL",
            Self::Count(_) => "COUNT",
            Self::Interval(_) => "INTERVAL",
            Self::BySecond(_) => "BYSECOND",
            Self::ByMinute(_) => "BYMINUTE",
            Self::ByHour(_) => "BYHOUR",
            Self::ByDay(_) => "BYDAY",
            Self::ByMonthDay(_) => "BYMONTHDAY",
            Self::ByYearDay(_) => "BYYEARDAY",
            Self::ByWeekNo(_) => "BYWEEKNO",
            Self::ByMonth(_) => "BYMONTH",
            Self::BySetPos(_) => "BYSETPOS",
            Self::Wkst(_) => "WKST",
            Self::Other { name, .. } => name,
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for RulePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=", self.name())?;
        match self {
            Self::Freq(freq) => write!(f, "{freq}"),
            Self::Until(until) => write!(f, "{until}"),
            Self::Count(n) | Self::Interval(n) => write!(f, "{n}"),
            Self::BySecond(v) | Self::ByMinute(v) | Self::ByHour(v) | Self::ByMonth(v) => {
                write_list(f, v)
            }
            Self::ByDay(v) => write_list(f, v),
            Self::ByMonthDay(v) | Self::ByYearDay(v) | Self::ByWeekNo(v) | Self::BySetPos(v) => {
                write_list(f, v)
            }
            Self::Wkst(day) => write!(f, "{day}"),
            Self::Other { value, .. } => f.write_str(value),
        }
    }
}

/// Recurrence rule (RFC 5545 §3.3.10).
///
/// An ordered list of rule parts. The first occurrence of a part wins for the
/// typed accessors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Recur {
    /// Rule parts in source order.
    pub parts: Vec<RulePart>,
}

macro_rules! list_accessor {
    ($(#[$doc:meta])* $fn_name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        #[must_use]
        pub fn $fn_name(&self) -> &[$ty] {
            self.parts
                .iter()
                .find_map(|p| match p {
                    RulePart::$variant(v) => Some(v.as_slice()),
                    _ => None,
                })
                .unwrap_or(&[])
        }
    };
}

impl Recur {
    /// Creates a rule with only a frequency.
    #[must_use]
    pub fn new(freq: Frequency) -> Self {
        Self {
            parts: vec![RulePart::Freq(freq)],
        }
    }

    /// Appends a rule part.
    #[must_use]
    pub fn with(mut self, part: RulePart) -> Self {
        self.parts.push(part);
        self
    }

    /// Returns the frequency, if present.
    #[must_use]
    pub fn freq(&self) -> Option<Frequency> {
        self.parts.iter().find_map(|p| match p {
            RulePart::Freq(f) => Some(*f),
            _ => None,
        })
    }

    /// Returns the interval (default 1).
    #[must_use]
    pub fn interval(&self) -> u32 {
        self.parts
            .iter()
            .find_map(|p| match p {
                RulePart::Interval(n) => Some((*n).max(1)),
                _ => None,
            })
            .unwrap_or(1)
    }

    /// Returns COUNT, if present.
    #[must_use]
    pub fn count(&self) -> Option<u32> {
        self.parts.iter().find_map(|p| match p {
            RulePart::Count(n) => Some(*n),
            _ => None,
        })
    }

    /// Returns UNTIL, if present.
    #[must_use]
    pub fn until(&self) -> Option<&RecurUntil> {
        self.parts.iter().find_map(|p| match p {
            RulePart::Until(u) => Some(u),
            _ => None,
        })
    }

    /// Returns the week start (default Monday).
    #[must_use]
    pub fn wkst(&self) -> Weekday {
        self.parts
            .iter()
            .find_map(|p| match p {
                RulePart::Wkst(d) => Some(*d),
                _ => None,
            })
            .unwrap_or(Weekday::Monday)
    }

    /// Returns true if the rule terminates on its own (COUNT or UNTIL).
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.count().is_some() || self.until().is_some()
    }

    list_accessor!(
        /// BYSECOND values.
        by_second, BySecond, u8
    );
    list_accessor!(
        /// BYMINUTE values.
        by_minute, ByMinute, u8
    );
    list_accessor!(
        /// BYHOUR values.
        by_hour, ByHour, u8
    );
    list_accessor!(
        /// BYDAY values.
        by_day, ByDay, WeekdayNum
    );
    list_accessor!(
        /// BYMONTHDAY values.
        by_monthday, ByMonthDay, i16
    );
    list_accessor!(
        /// BYYEARDAY values.
        by_yearday, ByYearDay, i16
    );
    list_accessor!(
        /// BYWEEKNO values.
        by_weekno, ByWeekNo, i16
    );
    list_accessor!(
        /// BYMONTH values.
        by_month, ByMonth, u8
    );
    list_accessor!(
        /// BYSETPOS values.
        by_setpos, BySetPos, i16
    );
}

impl fmt::Display for Recur {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}
