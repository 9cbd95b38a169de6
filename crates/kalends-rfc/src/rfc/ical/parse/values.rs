//! Value type parsers for iCalendar (RFC 5545 §3.3).
//!
//! Every parser takes the raw text plus the line and column used for error
//! reporting. DATE-TIME and TIME parsers also take the form resolved from the
//! property's TZID parameter; a trailing `Z` always wins over it.
#![expect(
    clippy::map_err_ignore,
    reason = "Value parsers report their own error kinds instead of std parse errors"
)]

use base64::Engine;
use chrono::{NaiveDate, NaiveTime};

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{
    DateTime, DateTimeForm, Duration, Frequency, Period, Recur, RecurUntil, RulePart, Time,
    UtcOffset, Weekday, WeekdayNum,
};

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a DATE value (RFC 5545 §3.3.4).
///
/// Format: YYYYMMDD (e.g., "19970714")
///
/// ## Errors
/// Returns an error if the string is not eight digits forming a real date.
pub fn parse_date(s: &str, line: usize, col: usize) -> ParseResult<NaiveDate> {
    let err = || ParseError::new(ParseErrorKind::InvalidDate, line, col);
    if s.len() != 8 || !all_digits(s) {
        return Err(err());
    }
    let year = s[0..4].parse::<i32>().map_err(|_| err())?;
    let month = s[4..6].parse::<u32>().map_err(|_| err())?;
    let day = s[6..8].parse::<u32>().map_err(|_| err())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(err)
}

/// Parses a TIME value (RFC 5545 §3.3.12).
///
/// Format: HHMMSS[Z]. A second of `60` is stored as 59 with the leap flag.
///
/// ## Errors
/// Returns an error if the string is not six digits in range.
pub fn parse_time(s: &str, form: &DateTimeForm, line: usize, col: usize) -> ParseResult<Time> {
    let err = || ParseError::new(ParseErrorKind::InvalidTime, line, col);
    let (digits, form) = match s.strip_suffix('Z') {
        Some(stripped) => (stripped, DateTimeForm::Utc),
        None => (s, form.clone()),
    };
    if digits.len() != 6 || !all_digits(digits) {
        return Err(err());
    }
    let hour = digits[0..2].parse::<u32>().map_err(|_| err())?;
    let minute = digits[2..4].parse::<u32>().map_err(|_| err())?;
    let second = digits[4..6].parse::<u32>().map_err(|_| err())?;
    if hour > 23 || minute > 59 || second > 60 {
        return Err(err());
    }
    let leap_second = second == 60;
    let local = NaiveTime::from_hms_opt(hour, minute, second.min(59)).ok_or_else(err)?;
    Ok(Time {
        local,
        form,
        leap_second,
    })
}

/// Parses a DATE-TIME value (RFC 5545 §3.3.5).
///
/// Format: YYYYMMDD"T"HHMMSS[Z] (e.g., "19970714T133000Z")
///
/// ## Errors
/// Returns an error if either half is malformed.
pub fn parse_datetime(
    s: &str,
    form: &DateTimeForm,
    line: usize,
    col: usize,
) -> ParseResult<DateTime> {
    let err = |_| ParseError::new(ParseErrorKind::InvalidDateTime, line, col);
    let (date_str, time_str) = s
        .split_once('T')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDateTime, line, col))?;
    let date = parse_date(date_str, line, col).map_err(err)?;
    let time = parse_time(time_str, form, line, col).map_err(err)?;
    Ok(DateTime {
        local: date.and_time(time.local),
        form: time.form,
        leap_second: time.leap_second,
    })
}

/// Parses a UTC-OFFSET value (RFC 5545 §3.3.14).
///
/// Format: (+|-)HHMM[SS] (e.g., "+0530", "-0800"). `-0000` is rejected.
///
/// ## Errors
/// Returns an error if the string is not a valid UTC offset.
pub fn parse_utc_offset(s: &str, line: usize, col: usize) -> ParseResult<UtcOffset> {
    let err = || ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col);
    let (sign, digits) = if let Some(rest) = s.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = s.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(err());
    };
    if !matches!(digits.len(), 4 | 6) || !all_digits(digits) {
        return Err(err());
    }
    let hours = digits[0..2].parse::<i32>().map_err(|_| err())?;
    let minutes = digits[2..4].parse::<i32>().map_err(|_| err())?;
    let seconds = if digits.len() == 6 {
        digits[4..6].parse::<i32>().map_err(|_| err())?
    } else {
        0
    };
    if minutes > 59 || seconds > 59 {
        return Err(err());
    }
    let total = hours * 3600 + minutes * 60 + seconds;
    if sign < 0 && total == 0 {
        return Err(err().with_context("-0000 is not allowed"));
    }
    Ok(UtcOffset::from_seconds(sign * total))
}

/// Parses a DURATION value (RFC 5545 §3.3.6).
///
/// Format: `[+|-]P nW` or `[+|-]P [nD] [T [nH] [nM] [nS]]`. Weeks cannot be
/// combined with other designators and at least one designator is required.
///
/// ## Errors
/// Returns an error if the string is not a valid duration.
pub fn parse_duration(s: &str, line: usize, col: usize) -> ParseResult<Duration> {
    let err = || ParseError::new(ParseErrorKind::InvalidDuration, line, col);
    let mut dur = Duration::zero();

    let unsigned = if let Some(rest) = s.strip_prefix('-') {
        dur.negative = true;
        rest
    } else {
        s.strip_prefix('+').unwrap_or(s)
    };
    let body = unsigned.strip_prefix('P').ok_or_else(err)?;

    if let Some(weeks) = body.strip_suffix('W') {
        if !all_digits(weeks) {
            return Err(err());
        }
        dur.weeks = weeks.parse().map_err(|_| err())?;
        return Ok(dur);
    }

    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    let mut seen = false;
    if !date_part.is_empty() {
        let days = date_part.strip_suffix('D').ok_or_else(err)?;
        if !all_digits(days) {
            return Err(err());
        }
        dur.days = days.parse().map_err(|_| err())?;
        seen = true;
    }

    if let Some(time) = time_part {
        let mut rest = time;
        let mut time_seen = false;
        for (designator, slot) in [
            ('H', &mut dur.hours),
            ('M', &mut dur.minutes),
            ('S', &mut dur.seconds),
        ] {
            let Some(end) = rest.find(|c: char| !c.is_ascii_digit()) else {
                break;
            };
            if end == 0 || !rest[end..].starts_with(designator) {
                continue;
            }
            *slot = rest[..end].parse().map_err(|_| err())?;
            rest = &rest[end + 1..];
            time_seen = true;
        }
        if !time_seen || !rest.is_empty() {
            return Err(err());
        }
        seen = true;
    }

    if seen { Ok(dur) } else { Err(err()) }
}

/// Parses a PERIOD value (RFC 5545 §3.3.9).
///
/// Format: start"/"end or start"/"duration
///
/// ## Errors
/// Returns an error if the string is not a valid period.
pub fn parse_period(
    s: &str,
    form: &DateTimeForm,
    line: usize,
    col: usize,
) -> ParseResult<Period> {
    let err = |_| ParseError::new(ParseErrorKind::InvalidPeriod, line, col);
    let (start_str, end_str) = s
        .split_once('/')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidPeriod, line, col))?;
    let start = parse_datetime(start_str, form, line, col).map_err(err)?;

    if end_str.starts_with(['P', '+', '-']) {
        let duration = parse_duration(end_str, line, col).map_err(err)?;
        Ok(Period::Duration { start, duration })
    } else {
        let end = parse_datetime(end_str, form, line, col).map_err(err)?;
        Ok(Period::Explicit { start, end })
    }
}

/// Parses a RECUR value (RFC 5545 §3.3.10).
///
/// Rule parts keep their written order. Unknown parts are preserved verbatim.
///
/// ## Errors
/// Returns an error if FREQ is missing or invalid, a part is malformed, or a
/// numeric part is out of range.
pub fn parse_recur(s: &str, line: usize, col: usize) -> ParseResult<Recur> {
    let mut recur = Recur::default();
    for part in s.split(';').filter(|p| !p.is_empty()) {
        let (key, value) = part.split_once('=').ok_or_else(|| {
            ParseError::new(ParseErrorKind::InvalidRecur, line, col)
                .with_context(format!("rule part '{part}' has no value"))
        })?;
        recur.parts.push(parse_rule_part(key, value, line, col)?);
    }
    if recur.freq().is_none() {
        return Err(ParseError::new(ParseErrorKind::MissingFrequency, line, col));
    }
    Ok(recur)
}

fn parse_rule_part(key: &str, value: &str, line: usize, col: usize) -> ParseResult<RulePart> {
    let invalid = |what: &str| {
        ParseError::new(ParseErrorKind::InvalidRecur, line, col)
            .with_context(format!("{what}={value}"))
    };
    let key = key.to_ascii_uppercase();
    Ok(match key.as_str() {
        "FREQ" => RulePart::Freq(
            Frequency::parse(value)
                .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidFrequency, line, col))?,
        ),
        "COUNT" => RulePart::Count(value.parse().map_err(|_| invalid("COUNT"))?),
        "INTERVAL" => {
            let interval: u32 = value.parse().map_err(|_| invalid("INTERVAL"))?;
            if interval == 0 {
                return Err(invalid("INTERVAL"));
            }
            RulePart::Interval(interval)
        }
        "UNTIL" => RulePart::Until(if value.contains('T') {
            RecurUntil::DateTime(
                parse_datetime(value, &DateTimeForm::Floating, line, col)
                    .map_err(|_| invalid("UNTIL"))?,
            )
        } else {
            RecurUntil::Date(parse_date(value, line, col).map_err(|_| invalid("UNTIL"))?)
        }),
        "BYSECOND" => RulePart::BySecond(unsigned_list(value, 60).ok_or_else(|| invalid(&key))?),
        "BYMINUTE" => RulePart::ByMinute(unsigned_list(value, 59).ok_or_else(|| invalid(&key))?),
        "BYHOUR" => RulePart::ByHour(unsigned_list(value, 23).ok_or_else(|| invalid(&key))?),
        "BYMONTH" => RulePart::ByMonth(
            unsigned_list(value, 12)
                .filter(|v| !v.contains(&0))
                .ok_or_else(|| invalid(&key))?,
        ),
        "BYMONTHDAY" => RulePart::ByMonthDay(signed_list(value, 31).ok_or_else(|| invalid(&key))?),
        "BYYEARDAY" => RulePart::ByYearDay(signed_list(value, 366).ok_or_else(|| invalid(&key))?),
        "BYWEEKNO" => RulePart::ByWeekNo(signed_list(value, 53).ok_or_else(|| invalid(&key))?),
        "BYSETPOS" => RulePart::BySetPos(signed_list(value, 366).ok_or_else(|| invalid(&key))?),
        "BYDAY" => RulePart::ByDay(
            value
                .split(',')
                .map(|v| parse_weekday_num(v, line, col))
                .collect::<ParseResult<_>>()?,
        ),
        "WKST" => RulePart::Wkst(
            Weekday::parse(value)
                .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday, line, col))?,
        ),
        _ => RulePart::Other {
            name: key,
            value: value.to_string(),
        },
    })
}

/// Parses `0..=max` values; `None` on any bad item.
fn unsigned_list(s: &str, max: u8) -> Option<Vec<u8>> {
    s.split(',')
        .map(|v| {
            if !all_digits(v) || v.len() > 2 {
                return None;
            }
            v.parse::<u8>().ok().filter(|n| *n <= max)
        })
        .collect()
}

/// Parses `[+|-]1..=max` values; `None` on any bad item or zero.
fn signed_list(s: &str, max: i16) -> Option<Vec<i16>> {
    s.split(',').map(|v| parse_ordinal(v, max)).collect()
}

fn parse_ordinal(s: &str, max: i16) -> Option<i16> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if !all_digits(digits) || digits.len() > 3 {
        return None;
    }
    let n = digits.parse::<i16>().ok().filter(|n| (1..=max).contains(n))?;
    Some(if negative { -n } else { n })
}

/// Parses a single weekday with optional ordinal (e.g., "MO", "1MO", "-1FR").
fn parse_weekday_num(s: &str, line: usize, col: usize) -> ParseResult<WeekdayNum> {
    let err = || {
        ParseError::new(ParseErrorKind::InvalidWeekday, line, col)
            .with_context(format!("BYDAY={s}"))
    };
    let split = s.len().checked_sub(2).ok_or_else(err)?;
    if !s.is_char_boundary(split) {
        return Err(err());
    }
    let (ordinal_str, weekday_str) = s.split_at(split);
    let weekday = Weekday::parse(weekday_str).ok_or_else(err)?;
    if ordinal_str.is_empty() {
        return Ok(WeekdayNum::every(weekday));
    }
    let ordinal = parse_ordinal(ordinal_str, 53).ok_or_else(err)?;
    Ok(WeekdayNum::nth(ordinal, weekday))
}

/// Unescapes text values (RFC 5545 §3.3.11).
///
/// Escape sequences: \\ \, \; \n \N. Unknown escapes are kept as written.
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n' | 'N') => result.push('\n'),
                Some(',') => result.push(','),
                Some(';') => result.push(';'),
                Some('\\') | None => result.push('\\'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Parses a BOOLEAN value (RFC 5545 §3.3.2).
///
/// ## Errors
/// Returns an error if the string is not "TRUE" or "FALSE".
pub fn parse_boolean(s: &str, line: usize, col: usize) -> ParseResult<bool> {
    match s.to_ascii_uppercase().as_str() {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        _ => Err(ParseError::new(ParseErrorKind::InvalidBoolean, line, col)),
    }
}

/// Parses an INTEGER value (RFC 5545 §3.3.8).
///
/// ## Errors
/// Returns an error if the string is not a signed decimal integer.
pub fn parse_integer(s: &str, line: usize, col: usize) -> ParseResult<i32> {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if !all_digits(digits) {
        return Err(ParseError::new(ParseErrorKind::InvalidInteger, line, col));
    }
    s.parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidInteger, line, col))
}

/// Parses a FLOAT value (RFC 5545 §3.3.7).
///
/// Format: `[+|-] 1*DIGIT ["." 1*DIGIT]`; exponents and `inf`/`nan` are
/// rejected.
///
/// ## Errors
/// Returns an error if the string is not a valid decimal number.
pub fn parse_float(s: &str, line: usize, col: usize) -> ParseResult<f64> {
    let err = || ParseError::new(ParseErrorKind::InvalidFloat, line, col);
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let valid = match unsigned.split_once('.') {
        Some((whole, fraction)) => all_digits(whole) && all_digits(fraction),
        None => all_digits(unsigned),
    };
    if !valid {
        return Err(err());
    }
    s.parse().map_err(|_| err())
}

/// Parses a BINARY value (RFC 5545 §3.3.1), base64 with the standard alphabet.
///
/// ## Errors
/// Returns an error if the payload is not valid base64.
pub fn parse_binary(s: &str, line: usize, col: usize) -> ParseResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(s.trim())
        .map_err(|e| {
            ParseError::new(ParseErrorKind::InvalidBinary, line, col).with_context(e.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOATING: DateTimeForm = DateTimeForm::Floating;

    #[test]
    fn parse_date_basic() {
        let date = parse_date("20260123", 1, 1).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 1, 23).unwrap());
    }

    #[test]
    fn parse_date_invalid() {
        assert!(parse_date("2026012", 1, 1).is_err());
        assert!(parse_date("20261301", 1, 1).is_err());
        assert!(parse_date("20230229", 1, 1).is_err());
        assert!(parse_date("2026-1-1", 1, 1).is_err());
    }

    #[test]
    fn parse_time_utc_and_local() {
        let time = parse_time("120000Z", &FLOATING, 1, 1).unwrap();
        assert_eq!(time.form, DateTimeForm::Utc);
        let time = parse_time("133000", &FLOATING, 1, 1).unwrap();
        assert_eq!(time.local, NaiveTime::from_hms_opt(13, 30, 0).unwrap());
        assert_eq!(time.form, DateTimeForm::Floating);
        assert!(parse_time("240000", &FLOATING, 1, 1).is_err());
    }

    #[test]
    fn parse_time_leap_second() {
        let time = parse_time("235960", &FLOATING, 1, 1).unwrap();
        assert!(time.leap_second);
        assert_eq!(time.local, NaiveTime::from_hms_opt(23, 59, 59).unwrap());
        assert!(parse_time("235961", &FLOATING, 1, 1).is_err());
    }

    #[test]
    fn parse_datetime_forms() {
        let zoned = DateTimeForm::Zoned {
            tzid: "America/New_York".into(),
        };
        let dt = parse_datetime("20260123T120000Z", &zoned, 1, 1).unwrap();
        assert!(dt.is_utc());
        let dt = parse_datetime("20260123T120000", &FLOATING, 1, 1).unwrap();
        assert!(dt.is_floating());
        let dt = parse_datetime("20260123T120000", &zoned, 1, 1).unwrap();
        assert_eq!(dt.tzid(), Some("America/New_York"));
        let dt = parse_datetime("19981231T235960Z", &FLOATING, 1, 1).unwrap();
        assert!(dt.leap_second);
        assert_eq!(dt.to_string(), "19981231T235960Z");
        assert!(parse_datetime("20260123", &FLOATING, 1, 1).is_err());
    }

    #[test]
    fn parse_duration_forms() {
        assert_eq!(parse_duration("P2W", 1, 1).unwrap().weeks, 2);
        let dur = parse_duration("P1DT2H30M", 1, 1).unwrap();
        assert_eq!((dur.days, dur.hours, dur.minutes), (1, 2, 30));
        let dur = parse_duration("-PT15M", 1, 1).unwrap();
        assert!(dur.negative);
        assert_eq!(dur.minutes, 15);
        let dur = parse_duration("+PT1H0M5S", 1, 1).unwrap();
        assert_eq!((dur.hours, dur.minutes, dur.seconds), (1, 0, 5));
        assert_eq!(parse_duration("PT5S", 1, 1).unwrap().seconds, 5);
    }

    #[test]
    fn parse_duration_rejects_bad_shapes() {
        for bad in ["P", "PT", "P1W2D", "P2DT", "P1H", "PT1D", "1D", "PT1S2M", "P1DW"] {
            assert!(parse_duration(bad, 1, 1).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn parse_utc_offset_values() {
        assert_eq!(
            parse_utc_offset("+0530", 1, 1).unwrap().as_seconds(),
            5 * 3600 + 30 * 60
        );
        assert_eq!(parse_utc_offset("-0800", 1, 1).unwrap().as_seconds(), -8 * 3600);
        assert_eq!(parse_utc_offset("+000130", 1, 1).unwrap().as_seconds(), 90);
        assert_eq!(parse_utc_offset("+0000", 1, 1).unwrap(), UtcOffset::UTC);
        assert!(parse_utc_offset("-0000", 1, 1).is_err());
        assert!(parse_utc_offset("0100", 1, 1).is_err());
        assert!(parse_utc_offset("+0160", 1, 1).is_err());
    }

    #[test]
    fn parse_recur_basic() {
        let rule = parse_recur("FREQ=DAILY;COUNT=10", 1, 1).unwrap();
        assert_eq!(rule.freq(), Some(Frequency::Daily));
        assert_eq!(rule.count(), Some(10));
        assert_eq!(rule.to_string(), "FREQ=DAILY;COUNT=10");
    }

    #[test]
    fn parse_recur_keeps_order_and_unknown_parts() {
        let rule = parse_recur("BYDAY=MO,-1FR;FREQ=MONTHLY;X-FOO=bar;WKST=SU", 1, 1).unwrap();
        assert_eq!(rule.by_day()[1], WeekdayNum::nth(-1, Weekday::Friday));
        assert_eq!(rule.wkst(), Weekday::Sunday);
        assert_eq!(rule.to_string(), "BYDAY=MO,-1FR;FREQ=MONTHLY;X-FOO=bar;WKST=SU");
    }

    #[test]
    fn parse_recur_until_forms() {
        let rule = parse_recur("FREQ=DAILY;UNTIL=20260131", 1, 1).unwrap();
        assert!(matches!(rule.until(), Some(RecurUntil::Date(_))));
        let rule = parse_recur("FREQ=DAILY;UNTIL=20260131T000000Z", 1, 1).unwrap();
        assert!(matches!(rule.until(), Some(RecurUntil::DateTime(dt)) if dt.is_utc()));
    }

    #[test]
    fn parse_recur_errors() {
        let err = parse_recur("COUNT=3", 1, 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingFrequency);
        let err = parse_recur("FREQ=FORTNIGHTLY", 1, 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidFrequency);
        let err = parse_recur("FREQ=WEEKLY;BYDAY=XX", 1, 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidWeekday);
        for bad in [
            "FREQ=DAILY;BYHOUR=24",
            "FREQ=DAILY;BYMONTHDAY=0",
            "FREQ=DAILY;BYMONTHDAY=32",
            "FREQ=YEARLY;BYWEEKNO=-54",
            "FREQ=YEARLY;BYMONTH=13",
            "FREQ=DAILY;INTERVAL=0",
            "FREQ=DAILY;COUNT=-1",
            "FREQ=DAILY;COUNT",
        ] {
            assert!(parse_recur(bad, 1, 1).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn unescape_text_basic() {
        assert_eq!(unescape_text("hello\\, world"), "hello, world");
        assert_eq!(unescape_text("line1\\nline2\\Nline3"), "line1\nline2\nline3");
        assert_eq!(unescape_text("back\\\\slash\\;"), "back\\slash;");
        assert_eq!(unescape_text("odd\\x"), "odd\\x");
    }

    #[test]
    fn parse_period_forms() {
        let period = parse_period("20260123T090000Z/20260123T170000Z", &FLOATING, 1, 1).unwrap();
        assert!(matches!(period, Period::Explicit { .. }));
        let period = parse_period("20260123T090000Z/PT8H", &FLOATING, 1, 1).unwrap();
        let Period::Duration { duration, .. } = &period else {
            panic!("expected duration period");
        };
        assert_eq!(duration.hours, 8);
        assert_eq!(period.end().unwrap().local.to_string(), "2026-01-23 17:00:00");
    }

    #[test]
    fn parse_scalars() {
        assert!(parse_boolean("true", 1, 1).unwrap());
        assert!(parse_boolean("yes", 1, 1).is_err());
        assert_eq!(parse_integer("-12", 1, 1).unwrap(), -12);
        assert!(parse_integer("1.5", 1, 1).is_err());
        assert!((parse_float("+37.386013", 1, 1).unwrap() - 37.386_013).abs() < f64::EPSILON);
        assert!(parse_float("1e5", 1, 1).is_err());
        assert!(parse_float("nan", 1, 1).is_err());
        assert_eq!(parse_binary("aGVsbG8=", 1, 1).unwrap(), b"hello");
        assert!(parse_binary("***", 1, 1).is_err());
    }
}
