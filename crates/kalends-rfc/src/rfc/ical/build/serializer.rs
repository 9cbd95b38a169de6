//! iCalendar serializer (RFC 5545).
//!
//! Properties and children are written in the order they are stored, so a
//! parsed document serializes back to an equal tree.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::escape::escape_text;
use super::fold::fold_line;
use crate::rfc::ical::core::{Calendar, Component, Parameter, Period, Property, Value, format_date};
use crate::rfc::ical::parse::delimiter;

/// Serializes a calendar to folded, CRLF-terminated text.
#[must_use]
pub fn serialize(calendar: &Calendar) -> String {
    serialize_component(&calendar.root)
}

/// Serializes a component and its children to folded, CRLF-terminated text.
#[must_use]
pub fn serialize_component(component: &Component) -> String {
    content_lines(component).map(|line| fold_line(&line)).collect()
}

/// Streams the unfolded content lines of a component: BEGIN, the
/// properties, each child, END.
pub fn content_lines(component: &Component) -> Box<dyn Iterator<Item = String> + '_> {
    Box::new(
        std::iter::once(format!("BEGIN:{}", component.name))
            .chain(component.properties.iter().map(format_property))
            .chain(component.children.iter().flat_map(content_lines))
            .chain(std::iter::once(format!("END:{}", component.name))),
    )
}

/// Formats one property as an unfolded content line.
///
/// A zoned DATE-TIME value gets its TZID parameter back if it is missing.
#[must_use]
pub fn format_property(prop: &Property) -> String {
    let mut line = prop.name.clone();
    for param in &prop.params {
        line.push(';');
        line.push_str(&param.to_string());
    }
    if prop.get_param("TZID").is_none()
        && let Some(tzid) = zone_of(&prop.value)
    {
        line.push(';');
        line.push_str(&Parameter::tzid(tzid).to_string());
    }
    line.push(':');
    line.push_str(&format_value(&prop.name, &prop.value));
    line
}

/// The TZID of the first zoned DATE-TIME in a value.
fn zone_of(value: &Value) -> Option<&str> {
    value.items().find_map(|item| match item {
        Value::DateTime(dt) => dt.tzid(),
        Value::Period(period) => period.start().tzid(),
        _ => None,
    })
}

/// Formats a property value. Lists are joined with the property's
/// delimiter.
#[must_use]
pub fn format_value(name: &str, value: &Value) -> String {
    match value {
        Value::Binary(bytes) => STANDARD.encode(bytes),
        Value::Boolean(true) => "TRUE".to_string(),
        Value::Boolean(false) => "FALSE".to_string(),
        Value::CalAddress(s) | Value::Uri(s) => s.clone(),
        Value::Date(d) => format_date(*d),
        Value::DateTime(dt) => dt.to_string(),
        Value::Duration(d) => d.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Period(Period::Explicit { start, end }) => format!("{start}/{end}"),
        Value::Period(Period::Duration { start, duration }) => format!("{start}/{duration}"),
        Value::Recur(rule) => rule.to_string(),
        Value::Text(s) => escape_text(s),
        Value::Time(t) => t.to_string(),
        Value::UtcOffset(o) => o.to_string(),
        Value::List(items) => {
            let separator = delimiter(name).unwrap_or(',').to_string();
            items
                .iter()
                .map(|item| format_value(name, item))
                .collect::<Vec<_>>()
                .join(&separator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::{ComponentKind, DateTime, Duration, names};
    use chrono::NaiveDate;

    fn at(h: u32, s: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, s)
            .unwrap()
    }

    #[test]
    fn writes_begin_properties_children_end() {
        let mut calendar = Calendar::new("-//Test//EN");
        let event = Component::new(ComponentKind::Event)
            .with_property(Property::text(names::UID, "abc"))
            .with_property(Property::text(names::SUMMARY, "Lunch, with Bob"));
        calendar.add_component(event).unwrap();

        let lines: Vec<String> = content_lines(&calendar.root).collect();
        assert_eq!(
            lines,
            [
                "BEGIN:VCALENDAR",
                "PRODID:-//Test//EN",
                "VERSION:2.0",
                "BEGIN:VEVENT",
                "UID:abc",
                "SUMMARY:Lunch\\, with Bob",
                "END:VEVENT",
                "END:VCALENDAR",
            ]
        );
        let text = serialize(&calendar);
        assert!(text.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(text.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn zoned_values_carry_tzid() {
        let prop = Property::new(
            names::DTSTART,
            Value::DateTime(DateTime::zoned(at(9, 0), "Europe/Paris")),
        );
        assert_eq!(
            format_property(&prop),
            "DTSTART;TZID=Europe/Paris:20240101T090000"
        );

        let declared = prop.clone().with_param(Parameter::tzid("Europe/Paris"));
        assert_eq!(format_property(&declared), format_property(&prop));
    }

    #[test]
    fn leap_second_is_written_back() {
        let mut dt = DateTime::utc(at(23, 59));
        dt.leap_second = true;
        assert_eq!(
            format_value(names::DTSTAMP, &Value::DateTime(dt)),
            "20240101T230060Z"
        );
    }

    #[test]
    fn lists_use_the_property_delimiter() {
        let geo = Value::List(vec![Value::Float(37.5), Value::Float(-122.25)]);
        assert_eq!(format_value("GEO", &geo), "37.5;-122.25");

        let categories = Value::List(vec![Value::Text("A,B".into()), Value::Text("C".into())]);
        assert_eq!(format_value("CATEGORIES", &categories), "A\\,B,C");

        let period = Value::Period(Period::Duration {
            start: DateTime::utc(at(9, 0)),
            duration: Duration::hms(1, 30, 0),
        });
        assert_eq!(format_value("FREEBUSY", &period), "20240101T090000Z/PT1H30M");
    }

    #[test]
    fn binary_is_base64() {
        assert_eq!(
            format_value("ATTACH", &Value::Binary(b"hello".to_vec())),
            "aGVsbG8="
        );
    }
}
