//! Occurrence instants and the context that orders them.
//!
//! An [`Instant`] is a DTSTART-like value: a DATE or a DATE-TIME in one of
//! its three forms. Ordering instants of different forms needs the calendar's
//! timezone table and the zone that floating values are read in; both are
//! carried by [`TimeContext`].

use std::cmp::Ordering;
use std::fmt;

use chrono::{LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;

use super::timezone::{TimezoneTable, normalize_tzid};
use crate::rfc::ical::core::{DateTime, DateTimeForm, Duration, UtcOffset, Value, format_date};

/// A DATE or DATE-TIME occurrence value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instant {
    Date(NaiveDate),
    DateTime(DateTime),
}

impl Instant {
    /// Reads an instant from a DATE, DATE-TIME or PERIOD (its start) value.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(Self::Date(*d)),
            Value::DateTime(dt) => Some(Self::DateTime(dt.clone())),
            Value::Period(p) => Some(Self::DateTime(p.start().clone())),
            _ => None,
        }
    }

    /// Converts back into a property value.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Date(d) => Value::Date(d),
            Self::DateTime(dt) => Value::DateTime(dt),
        }
    }

    /// Wall-clock value; a DATE is its midnight.
    #[must_use]
    pub fn local(&self) -> NaiveDateTime {
        match self {
            Self::Date(d) => d.and_time(NaiveTime::MIN),
            Self::DateTime(dt) => dt.local,
        }
    }

    /// Returns the same kind of instant at another wall-clock value.
    #[must_use]
    pub fn with_local(&self, local: NaiveDateTime) -> Self {
        match self {
            Self::Date(_) => Self::Date(local.date()),
            Self::DateTime(dt) => Self::DateTime(dt.with_local(local)),
        }
    }

    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns the DATE-TIME form; DATE values have none.
    #[must_use]
    pub const fn form(&self) -> Option<&DateTimeForm> {
        match self {
            Self::Date(_) => None,
            Self::DateTime(dt) => Some(&dt.form),
        }
    }

    /// Returns the TZID of a zoned DATE-TIME.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.form().and_then(DateTimeForm::tzid)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => f.write_str(&format_date(*d)),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// The zone floating values and DATEs are read in when they meet zoned values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatingZone {
    Fixed(UtcOffset),
    Named(Tz),
}

impl Default for FloatingZone {
    fn default() -> Self {
        Self::Fixed(UtcOffset::UTC)
    }
}

impl FloatingZone {
    /// Parses `UTC`, `Z` or a zone name (normalised like a TZID).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("UTC") || name.eq_ignore_ascii_case("Z") {
            return Some(Self::default());
        }
        normalize_tzid(name).parse::<Tz>().ok().map(Self::Named)
    }

    /// Converts a wall-clock value in this zone to UTC.
    #[must_use]
    pub fn local_to_utc(self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::Fixed(offset) => local.checked_sub_signed(offset.as_delta()),
            Self::Named(tz) => external_to_utc(tz, local),
        }
    }

    /// Converts a UTC value to wall-clock time in this zone.
    #[must_use]
    pub fn utc_to_local(self, utc: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::Fixed(offset) => utc.checked_add_signed(offset.as_delta()),
            Self::Named(tz) => Some(tz.from_utc_datetime(&utc).naive_local()),
        }
    }
}

/// Local to UTC through a chrono-tz zone.
///
/// A repeated wall-clock time takes its first occurrence. A skipped one is
/// read with the offset in effect before the gap.
pub(crate) fn external_to_utc(tz: Tz, local: NaiveDateTime) -> Option<NaiveDateTime> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.naive_utc()),
        LocalResult::None => {
            let before = local.checked_sub_signed(TimeDelta::try_days(1)?)?;
            let offset = tz.from_local_datetime(&before).earliest()?.offset().fix();
            local.checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))
        }
    }
}

/// Everything needed to order instants of one calendar.
#[derive(Debug, Clone, Copy)]
pub struct TimeContext<'a> {
    timezones: &'a TimezoneTable,
    floating: FloatingZone,
}

impl<'a> TimeContext<'a> {
    #[must_use]
    pub const fn new(timezones: &'a TimezoneTable, floating: FloatingZone) -> Self {
        Self {
            timezones,
            floating,
        }
    }

    #[must_use]
    pub const fn timezones(&self) -> &'a TimezoneTable {
        self.timezones
    }

    #[must_use]
    pub const fn floating(&self) -> FloatingZone {
        self.floating
    }

    /// Converts a wall-clock value of the given form to UTC.
    ///
    /// Unresolvable zones are read as floating.
    #[must_use]
    pub fn local_to_utc(&self, local: NaiveDateTime, form: &DateTimeForm) -> Option<NaiveDateTime> {
        match form {
            DateTimeForm::Utc => Some(local),
            DateTimeForm::Floating => self.floating.local_to_utc(local),
            DateTimeForm::Zoned { tzid } => {
                let zone = self.timezones.resolve(tzid);
                if zone.is_resolved() {
                    zone.local_to_utc(local)
                } else {
                    self.floating.local_to_utc(local)
                }
            }
        }
    }

    /// Converts a UTC value to wall-clock time of the given form.
    #[must_use]
    pub fn utc_to_local(&self, utc: NaiveDateTime, form: &DateTimeForm) -> Option<NaiveDateTime> {
        match form {
            DateTimeForm::Utc => Some(utc),
            DateTimeForm::Floating => self.floating.utc_to_local(utc),
            DateTimeForm::Zoned { tzid } => {
                let zone = self.timezones.resolve(tzid);
                if zone.is_resolved() {
                    zone.utc_to_local(utc)
                } else {
                    self.floating.utc_to_local(utc)
                }
            }
        }
    }

    /// Returns the instant as a UTC wall-clock value.
    #[must_use]
    pub fn to_utc(&self, instant: &Instant) -> Option<NaiveDateTime> {
        match instant {
            Instant::Date(_) => self.floating.local_to_utc(instant.local()),
            Instant::DateTime(dt) => self.local_to_utc(dt.local, &dt.form),
        }
    }

    /// Orders two instants.
    ///
    /// Values in the same frame (both floating or DATE, both UTC, or zoned in
    /// the same TZID) compare by wall clock; others through UTC.
    #[must_use]
    pub fn compare(&self, a: &Instant, b: &Instant) -> Ordering {
        if same_frame(a, b) {
            return a.local().cmp(&b.local());
        }
        match (self.to_utc(a), self.to_utc(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.local().cmp(&b.local()),
        }
    }

    /// Adds a duration. Days and weeks move the wall clock; hours, minutes and
    /// seconds are exact and pass through UTC for zoned values.
    #[must_use]
    pub fn add_duration(&self, instant: &Instant, duration: &Duration) -> Option<Instant> {
        match instant {
            Instant::Date(d) if duration.is_whole_days() => {
                duration.add_to_date(*d).map(Instant::Date)
            }
            Instant::Date(d) => duration
                .add_to(d.and_time(NaiveTime::MIN))
                .map(|local| Instant::DateTime(DateTime::floating(local))),
            Instant::DateTime(dt) => {
                let days = Duration {
                    hours: 0,
                    minutes: 0,
                    seconds: 0,
                    ..*duration
                };
                let exact = Duration {
                    weeks: 0,
                    days: 0,
                    ..*duration
                };
                let shifted = days.add_to(dt.local)?;
                let local = if dt.tzid().is_some() {
                    let utc = self.local_to_utc(shifted, &dt.form)?;
                    self.utc_to_local(exact.add_to(utc)?, &dt.form)?
                } else {
                    exact.add_to(shifted)?
                };
                Some(Instant::DateTime(dt.with_local(local)))
            }
        }
    }

    /// Moves `value` by the distance from `from` to `to`.
    ///
    /// When `from` and `to` share a frame the wall-clock difference is
    /// applied, otherwise the exact difference between their UTC values.
    #[must_use]
    pub fn shift(&self, value: &Instant, from: &Instant, to: &Instant) -> Option<Instant> {
        if same_frame(from, to) {
            let delta = to.local().signed_duration_since(from.local());
            return value
                .local()
                .checked_add_signed(delta)
                .map(|local| value.with_local(local));
        }

        let delta = self.to_utc(to)?.signed_duration_since(self.to_utc(from)?);
        match value {
            Instant::Date(d) => d
                .and_time(NaiveTime::MIN)
                .checked_add_signed(delta)
                .map(|local| Instant::Date(local.date())),
            Instant::DateTime(dt) => {
                let utc = self
                    .local_to_utc(dt.local, &dt.form)?
                    .checked_add_signed(delta)?;
                let local = self.utc_to_local(utc, &dt.form)?;
                Some(Instant::DateTime(dt.with_local(local)))
            }
        }
    }
}

fn same_frame(a: &Instant, b: &Instant) -> bool {
    match (a.form(), b.form()) {
        (None | Some(DateTimeForm::Floating), None | Some(DateTimeForm::Floating))
        | (Some(DateTimeForm::Utc), Some(DateTimeForm::Utc)) => true,
        (Some(DateTimeForm::Zoned { tzid: x }), Some(DateTimeForm::Zoned { tzid: y })) => x == y,
        _ => false,
    }
}
