//! Value-type registry.
//!
//! Maps property names to the value types they accept and runs the ordered
//! fallback trial that turns a raw value into a typed [`Value`].

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::values::{
    parse_binary, parse_boolean, parse_date, parse_datetime, parse_duration, parse_float,
    parse_integer, parse_period, parse_recur, parse_time, parse_utc_offset, unescape_text,
};
use crate::rfc::ical::core::{DateTimeForm, Parameter, Property, Value, ValueType};

use crate::rfc::ical::core::ValueType::{
    Binary, CalAddress, Date, DateTime, Duration, Float, Integer, Period, Recur, Text, UtcOffset,
    Uri,
};

/// Returns the value types a property accepts, default first.
///
/// Names without an entry (X- and unregistered IANA properties) accept TEXT.
#[must_use]
pub fn accepted_types(name: &str) -> &'static [ValueType] {
    match name {
        "ATTACH" => &[Uri, Binary],
        "GEO" => &[Float],
        "PERCENT-COMPLETE" | "PRIORITY" | "REPEAT" | "SEQUENCE" => &[Integer],
        "COMPLETED" | "CREATED" | "DTSTAMP" | "LAST-MODIFIED" => &[DateTime],
        "DTEND" | "DUE" | "DTSTART" | "RECURRENCE-ID" | "EXDATE" => &[DateTime, Date],
        "DURATION" => &[Duration],
        "FREEBUSY" => &[Period],
        "TZOFFSETFROM" | "TZOFFSETTO" => &[UtcOffset],
        "TZURL" | "URL" => &[Uri],
        "ATTENDEE" | "ORGANIZER" => &[CalAddress],
        "RRULE" | "EXRULE" => &[Recur],
        "RDATE" => &[DateTime, Date, Period],
        "TRIGGER" => &[Duration, DateTime],
        _ => &[Text],
    }
}

/// Returns true if the property name has its own registry entry.
///
/// Registered names are schema-checked per component; others are free-form.
#[must_use]
pub fn is_registered(name: &str) -> bool {
    matches!(
        name,
        "CALSCALE"
            | "METHOD"
            | "PRODID"
            | "VERSION"
            | "CATEGORIES"
            | "CLASS"
            | "COMMENT"
            | "DESCRIPTION"
            | "LOCATION"
            | "RESOURCES"
            | "STATUS"
            | "SUMMARY"
            | "TRANSP"
            | "TZID"
            | "TZNAME"
            | "CONTACT"
            | "RELATED-TO"
            | "UID"
            | "ACTION"
            | "REQUEST-STATUS"
    ) || !matches!(accepted_types(name), [Text])
}

/// Returns the default value type of a property.
#[must_use]
pub fn default_type(name: &str) -> ValueType {
    accepted_types(name).first().copied().unwrap_or(Text)
}

/// Returns the separator of a multi-valued property.
#[must_use]
pub fn delimiter(name: &str) -> Option<char> {
    match name {
        "CATEGORIES" | "RESOURCES" | "FREEBUSY" | "EXDATE" | "RDATE" => Some(','),
        "GEO" | "REQUEST-STATUS" => Some(';'),
        _ => None,
    }
}

/// Parses one raw scalar under one value type.
///
/// ## Errors
/// Returns the type parser's error.
pub fn parse_value(
    value_type: ValueType,
    raw: &str,
    form: &DateTimeForm,
    line: usize,
    col: usize,
) -> ParseResult<Value> {
    Ok(match value_type {
        ValueType::Binary => Value::Binary(parse_binary(raw, line, col)?),
        ValueType::Boolean => Value::Boolean(parse_boolean(raw, line, col)?),
        ValueType::CalAddress => Value::CalAddress(raw.to_string()),
        ValueType::Date => Value::Date(parse_date(raw, line, col)?),
        ValueType::DateTime => Value::DateTime(parse_datetime(raw, form, line, col)?),
        ValueType::Duration => Value::Duration(parse_duration(raw, line, col)?),
        ValueType::Float => Value::Float(parse_float(raw, line, col)?),
        ValueType::Integer => Value::Integer(parse_integer(raw, line, col)?),
        ValueType::Period => Value::Period(parse_period(raw, form, line, col)?),
        ValueType::Recur => Value::Recur(Box::new(parse_recur(raw, line, col)?)),
        ValueType::Text => Value::Text(unescape_text(raw)),
        ValueType::Time => Value::Time(parse_time(raw, form, line, col)?),
        ValueType::Uri => Value::Uri(raw.to_string()),
        ValueType::UtcOffset => Value::UtcOffset(parse_utc_offset(raw, line, col)?),
    })
}

/// Splits on `delim` except where it is backslash-escaped.
fn split_unescaped(raw: &str, delim: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in raw.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == delim {
            parts.push(&raw[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&raw[start..]);
    parts
}

/// Picks the type order for a property: the VALUE parameter first when it
/// is acceptable, then every accepted type.
fn trial_order(name: &str, params: &[Parameter], line: usize) -> Vec<ValueType> {
    let accepted = accepted_types(name);
    let mut order = Vec::with_capacity(accepted.len() + 1);

    let requested = params
        .iter()
        .find(|p| p.name == "VALUE")
        .and_then(Parameter::value);
    if let Some(requested) = requested {
        match ValueType::parse(requested) {
            Some(ty) if accepted.contains(&ty) || !is_registered(name) => order.push(ty),
            _ => {
                tracing::warn!(line, property = name, value = requested, "VALUE not accepted for property");
            }
        }
    }
    for ty in accepted {
        if !order.contains(ty) {
            order.push(*ty);
        }
    }
    order
}

/// Parses a property value with the registry's resolution order.
///
/// Multi-valued properties are split first and every item must parse under
/// the same type; they always produce a [`Value::List`].
///
/// ## Errors
/// Returns [`ParseErrorKind::InvalidValue`] listing every failed trial when
/// no accepted type parses the value.
pub fn parse_property_value(
    name: &str,
    raw: &str,
    params: &[Parameter],
    form: &DateTimeForm,
    line: usize,
    col: usize,
) -> ParseResult<Value> {
    let delim = delimiter(name);
    let mut failures = Vec::new();

    for ty in trial_order(name, params, line) {
        let attempt = match delim {
            Some(d) => split_unescaped(raw, d)
                .into_iter()
                .map(|item| parse_value(ty, item, form, line, col))
                .collect::<ParseResult<Vec<_>>>()
                .map(Value::List),
            None => parse_value(ty, raw, form, line, col),
        };
        match attempt {
            Ok(value) => return Ok(value),
            Err(e) => failures.push(format!("{ty}: {}", e.kind)),
        }
    }

    Err(ParseError::new(ParseErrorKind::InvalidValue, line, col)
        .with_context(format!("{name}: {}", failures.join("; "))))
}

/// Builds a property for a synthesized value, adding `VALUE=` when the value
/// type is not the property's default.
#[must_use]
pub fn property_with_value(name: &str, value: Value) -> Property {
    let mut prop = Property::new(name, value);
    if let Some(ty) = prop
        .value
        .item_type()
        .filter(|ty| *ty != default_type(&prop.name))
    {
        prop.set_param(Parameter::value_type(ty.as_str()));
    }
    prop
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse(name: &str, raw: &str, params: &[Parameter]) -> ParseResult<Value> {
        parse_property_value(name, raw, params, &DateTimeForm::Floating, 1, 1)
    }

    #[test]
    fn defaults_and_registration() {
        assert_eq!(default_type("DTSTART"), DateTime);
        assert_eq!(default_type("X-CUSTOM"), Text);
        assert_eq!(accepted_types("RDATE"), &[DateTime, Date, Period]);
        assert!(is_registered("SUMMARY"));
        assert!(is_registered("TRIGGER"));
        assert!(!is_registered("X-WR-CALNAME"));
    }

    #[test]
    fn fallback_to_second_accepted_type() {
        let value = parse("DTSTART", "20240101", &[]).unwrap();
        assert_eq!(
            value,
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        let value = parse("TRIGGER", "20240101T090000Z", &[]).unwrap();
        assert!(matches!(value, Value::DateTime(dt) if dt.is_utc()));
    }

    #[test]
    fn value_param_selects_type_first() {
        let value = parse("RDATE", "20240101T090000Z/PT1H", &[Parameter::value_type("PERIOD")])
            .unwrap();
        assert!(matches!(value, Value::List(items) if matches!(items[0], Value::Period(_))));
    }

    #[test]
    fn unaccepted_value_param_falls_back() {
        let value = parse("DTSTART", "20240101T090000", &[Parameter::value_type("INTEGER")])
            .unwrap();
        assert!(matches!(value, Value::DateTime(_)));
    }

    #[test]
    fn unregistered_property_honours_value_param() {
        let value = parse("X-COUNT", "42", &[Parameter::value_type("INTEGER")]).unwrap();
        assert_eq!(value, Value::Integer(42));
        let value = parse("X-COUNT", "forty", &[Parameter::value_type("INTEGER")]).unwrap();
        assert_eq!(value, Value::Text("forty".into()));
    }

    #[test]
    fn delimited_values_split_before_typing() {
        let value = parse("EXDATE", "20240101T090000Z,20240102T090000Z", &[]).unwrap();
        assert_eq!(value.items().count(), 2);

        let value = parse("CATEGORIES", "a\\,b,c", &[]).unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::Text("a,b".into()), Value::Text("c".into())])
        );

        let value = parse("GEO", "37.386013;-122.082932", &[]).unwrap();
        assert_eq!(value.items().count(), 2);
    }

    #[test]
    fn no_accepted_type_reports_every_failure() {
        let err = parse("DTSTART", "tomorrow", &[]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidValue);
        let context = err.context.unwrap();
        assert!(context.contains("DATE-TIME"));
        assert!(context.contains("DATE:"));
    }

    #[test]
    fn synthesized_property_gets_value_param() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let prop = property_with_value("RECURRENCE-ID", date);
        assert_eq!(prop.get_param_value("VALUE"), Some("DATE"));

        let prop = property_with_value("SUMMARY", Value::Text("x".into()));
        assert!(prop.params.is_empty());
    }
}
