//! iCalendar property values (RFC 5545 §3.3).

use std::fmt;

use chrono::NaiveDate;

use super::{DateTime, Duration, Recur, Time, UtcOffset};

/// PERIOD value (RFC 5545 §3.3.9).
///
/// A precise period of time, defined by either an explicit start and end or a
/// start and a duration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Period {
    /// Explicit start and end times.
    Explicit {
        /// Start of the period.
        start: DateTime,
        /// End of the period.
        end: DateTime,
    },
    /// Start time and duration.
    Duration {
        /// Start of the period.
        start: DateTime,
        /// Duration of the period.
        duration: Duration,
    },
}

impl Period {
    /// Returns the start of the period.
    #[must_use]
    pub fn start(&self) -> &DateTime {
        match self {
            Self::Explicit { start, .. } | Self::Duration { start, .. } => start,
        }
    }

    /// Returns the end of the period, computing it from the duration if
    /// necessary.
    #[must_use]
    pub fn end(&self) -> Option<DateTime> {
        match self {
            Self::Explicit { end, .. } => Some(end.clone()),
            Self::Duration { start, duration } => {
                duration.add_to(start.local).map(|local| start.with_local(local))
            }
        }
    }
}

/// The value types of RFC 5545 §3.3, used as keys of the value-type registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Binary,
    Boolean,
    CalAddress,
    Date,
    DateTime,
    Duration,
    Float,
    Integer,
    Period,
    Recur,
    Text,
    Time,
    Uri,
    UtcOffset,
}

impl ValueType {
    /// Returns the RFC name of the value type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
            Self::Boolean => "BOOLEAN",
            Self::CalAddress => "CAL-ADDRESS",
            Self::Date => "DATE",
            Self::DateTime => "DATE-TIME",
            Self::Duration => "DURATION",
            Self::Float => "FLOAT",
            Self::Integer => "INTEGER",
            Self::Period => "PERIOD",
            Self::Recur => "RECUR",
            Self::Text => "TEXT",
            Self::Time => "TIME",
            Self::Uri => "URI",
            Self::UtcOffset => "UTC-OFFSET",
        }
    }

    /// Parses a VALUE parameter (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "BINARY" => Self::Binary,
            "BOOLEAN" => Self::Boolean,
            "CAL-ADDRESS" => Self::CalAddress,
            "DATE" => Self::Date,
            "DATE-TIME" => Self::DateTime,
            "DURATION" => Self::Duration,
            "FLOAT" => Self::Float,
            "INTEGER" => Self::Integer,
            "PERIOD" => Self::Period,
            "RECUR" => Self::Recur,
            "TEXT" => Self::Text,
            "TIME" => Self::Time,
            "URI" => Self::Uri,
            "UTC-OFFSET" => Self::UtcOffset,
            _ => return None,
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// BINARY value (decoded bytes).
    Binary(Vec<u8>),
    /// BOOLEAN value.
    Boolean(bool),
    /// CAL-ADDRESS value (typically mailto: URI).
    CalAddress(String),
    /// DATE value.
    Date(NaiveDate),
    /// DATE-TIME value.
    DateTime(DateTime),
    /// DURATION value.
    Duration(Duration),
    /// FLOAT value.
    Float(f64),
    /// INTEGER value.
    Integer(i32),
    /// PERIOD value.
    Period(Period),
    /// RECUR value.
    Recur(Box<Recur>),
    /// TEXT value (unescaped).
    Text(String),
    /// TIME value.
    Time(Time),
    /// URI value.
    Uri(String),
    /// UTC-OFFSET value.
    UtcOffset(UtcOffset),
    /// Values of a multi-valued property (EXDATE, CATEGORIES, GEO, ...).
    List(Vec<Value>),
}

impl Value {
    /// Returns the value type, or `None` for a list.
    #[must_use]
    pub const fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Self::Binary(_) => ValueType::Binary,
            Self::Boolean(_) => ValueType::Boolean,
            Self::CalAddress(_) => ValueType::CalAddress,
            Self::Date(_) => ValueType::Date,
            Self::DateTime(_) => ValueType::DateTime,
            Self::Duration(_) => ValueType::Duration,
            Self::Float(_) => ValueType::Float,
            Self::Integer(_) => ValueType::Integer,
            Self::Period(_) => ValueType::Period,
            Self::Recur(_) => ValueType::Recur,
            Self::Text(_) => ValueType::Text,
            Self::Time(_) => ValueType::Time,
            Self::Uri(_) => ValueType::Uri,
            Self::UtcOffset(_) => ValueType::UtcOffset,
            Self::List(_) => return None,
        })
    }

    /// Returns the type of a scalar value or of the first list item.
    #[must_use]
    pub fn item_type(&self) -> Option<ValueType> {
        match self {
            Self::List(items) => items.first().and_then(Self::value_type),
            other => other.value_type(),
        }
    }

    /// Iterates the scalar items: the value itself, or each list item.
    pub fn items(&self) -> impl Iterator<Item = &Self> {
        let slice = match self {
            Self::List(items) => items.as_slice(),
            other => std::slice::from_ref(other),
        };
        slice.iter()
    }

    /// Returns this value as text, if it is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns this value as an integer, if it is an integer value.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns this value as a date-time, if it is a date-time value.
    #[must_use]
    pub const fn as_datetime(&self) -> Option<&DateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Returns this value as a duration, if it is a duration value.
    #[must_use]
    pub const fn as_duration(&self) -> Option<&Duration> {
        match self {
            Self::Duration(d) => Some(d),
            _ => None,
        }
    }

    /// Returns this value as a recurrence rule, if it is one.
    #[must_use]
    pub fn as_recur(&self) -> Option<&Recur> {
        match self {
            Self::Recur(r) => Some(r),
            _ => None,
        }
    }

    /// Returns this value as a UTC offset, if it is one.
    #[must_use]
    pub const fn as_utc_offset(&self) -> Option<UtcOffset> {
        match self {
            Self::UtcOffset(o) => Some(*o),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32) -> DateTime {
        DateTime::utc(
            NaiveDate::from_ymd_opt(2026, 1, 23)
                .and_then(|d| d.and_hms_opt(h, 0, 0))
                .unwrap(),
        )
    }

    #[test]
    fn period_end_from_duration() {
        let period = Period::Duration {
            start: dt(10),
            duration: Duration::hms(2, 0, 0),
        };
        assert_eq!(period.end(), Some(dt(12)));
        assert_eq!(period.start(), &dt(10));
    }

    #[test]
    fn value_type_names_round_trip() {
        for name in ["DATE-TIME", "utc-offset", "CAL-ADDRESS", "RECUR"] {
            let ty = ValueType::parse(name).unwrap();
            assert!(ty.as_str().eq_ignore_ascii_case(name));
        }
        assert_eq!(ValueType::parse("X-CUSTOM"), None);
    }

    #[test]
    fn list_items_and_item_type() {
        let list = Value::List(vec![Value::DateTime(dt(1)), Value::DateTime(dt(2))]);
        assert_eq!(list.value_type(), None);
        assert_eq!(list.item_type(), Some(ValueType::DateTime));
        assert_eq!(list.items().count(), 2);

        let scalar = Value::Integer(5);
        assert_eq!(scalar.items().count(), 1);
        assert_eq!(scalar.as_integer(), Some(5));
    }
}
