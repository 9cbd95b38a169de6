//! Structural validation of iCalendar components.
//!
//! [`validate_component`] runs when the parser closes a component: property
//! cardinality from the [`schema`] tables, then the cross-field rules of the
//! component's kind. Problems that RFC 5545 treats as interoperability issues
//! (missing DTSTAMP/UID, repeated RRULE) are logged, not returned.

mod schema;

pub use schema::{Cardinality, Schema, schema_for};

use std::collections::HashMap;

use crate::rfc::ical::core::{Component, ComponentKind, Value, names};
use crate::rfc::ical::parse::is_registered;

/// A component-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{component} requires {property}")]
    MissingProperty {
        component: String,
        property: &'static str,
    },

    #[error("{component} allows {property} only once")]
    DuplicateProperty { component: String, property: String },

    #[error("{property} is not allowed in {component}")]
    UnexpectedProperty { component: String, property: String },

    #[error("{component} cannot have both {first} and {second}")]
    Conflict {
        component: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("{component}: {property} value type differs from DTSTART")]
    TypeMismatch {
        component: String,
        property: &'static str,
    },

    #[error("{component}: {property} must be a local time")]
    NotLocal {
        component: String,
        property: &'static str,
    },

    #[error("{component}: DURATION must be whole days for a DATE DTSTART")]
    DurationNotWholeDays { component: String },

    #[error("{property} has no FREQ")]
    MissingFrequency { property: &'static str },

    #[error("VTIMEZONE has no STANDARD or DAYLIGHT observance")]
    MissingObservance,

    #[error("VALARM DURATION and REPEAT must appear together")]
    AlarmRepeat,

    #[error("VALARM with ACTION={action} requires {property}")]
    AlarmAction {
        action: String,
        property: &'static str,
    },

    #[error("VALARM with ACTION=AUDIO allows one ATTACH")]
    AlarmAttach,

    #[error("{component} {uid} has more than one base instance")]
    MultipleBases { component: String, uid: String },

    #[error("{component} {uid}: RECURRENCE-ID value type differs from the base DTSTART")]
    OverrideType { component: String, uid: String },

    #[error("{component} {uid}: RECURRENCE-ID {recurrence_id} matches no instance")]
    UnmatchedOverride {
        component: String,
        uid: String,
        recurrence_id: String,
    },
}

/// Validates one component, not its children.
///
/// ## Errors
/// Returns the first violated rule.
pub fn validate_component(component: &Component) -> Result<(), ValidationError> {
    let Some(schema) = schema_for(component.kind) else {
        return Ok(());
    };
    check_cardinality(component, schema)?;
    check_rules(component)?;

    match component.kind {
        ComponentKind::Calendar => check_calendar(component),
        ComponentKind::Event => check_event(component),
        ComponentKind::Todo => check_todo(component),
        ComponentKind::Journal => same_type_as_start(component, names::RECURRENCE_ID),
        ComponentKind::Timezone => check_timezone(component),
        ComponentKind::Standard | ComponentKind::Daylight => check_observance(component),
        ComponentKind::Alarm => check_alarm(component),
        ComponentKind::FreeBusy | ComponentKind::Other => Ok(()),
    }
}

/// Validates a component and every descendant, collecting every violation.
#[must_use]
pub fn validate_tree(component: &Component) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    collect(component, &mut errors);
    errors
}

fn collect(component: &Component, errors: &mut Vec<ValidationError>) {
    for child in &component.children {
        collect(child, errors);
    }
    if let Err(e) = validate_component(component) {
        errors.push(e);
    }
}

fn check_cardinality(component: &Component, schema: &Schema) -> Result<(), ValidationError> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for prop in &component.properties {
        *counts.entry(prop.name.as_str()).or_default() += 1;
    }

    for (name, count) in &counts {
        match schema.cardinality(name) {
            Some(Cardinality::Key | Cardinality::Required | Cardinality::Once) if *count > 1 => {
                return Err(ValidationError::DuplicateProperty {
                    component: component.name.clone(),
                    property: (*name).to_string(),
                });
            }
            None if is_registered(name) => {
                return Err(ValidationError::UnexpectedProperty {
                    component: component.name.clone(),
                    property: (*name).to_string(),
                });
            }
            _ => {}
        }
    }

    for (name, cardinality) in schema.mandatory() {
        if counts.contains_key(name) {
            continue;
        }
        if cardinality == Cardinality::Key {
            return Err(ValidationError::MissingProperty {
                component: component.name.clone(),
                property: name,
            });
        }
        tracing::warn!(component = %component.name, property = name, "required property missing");
    }
    Ok(())
}

/// Checks recurrence rules shared by every kind that may carry them.
fn check_rules(component: &Component) -> Result<(), ValidationError> {
    for property in [names::RRULE, names::EXRULE] {
        let mut count = 0;
        for prop in component.get_properties(property) {
            count += 1;
            if prop.value.as_recur().and_then(|r| r.freq()).is_none() {
                return Err(ValidationError::MissingFrequency { property });
            }
        }
        if count > 1 {
            tracing::warn!(component = %component.name, property, count, "more than one recurrence rule");
        }
    }
    Ok(())
}

fn is_date(value: &Value) -> bool {
    matches!(value, Value::Date(_))
}

fn same_type_as_start(component: &Component, property: &'static str) -> Result<(), ValidationError> {
    let (Some(start), Some(other)) = (component.value(names::DTSTART), component.value(property))
    else {
        return Ok(());
    };
    if is_date(start) == is_date(other) {
        Ok(())
    } else {
        Err(ValidationError::TypeMismatch {
            component: component.name.clone(),
            property,
        })
    }
}

fn exclusive(
    component: &Component,
    first: &'static str,
    second: &'static str,
) -> Result<(), ValidationError> {
    if component.has_property(first) && component.has_property(second) {
        Err(ValidationError::Conflict {
            component: component.name.clone(),
            first,
            second,
        })
    } else {
        Ok(())
    }
}

fn check_event(event: &Component) -> Result<(), ValidationError> {
    exclusive(event, names::DTEND, names::DURATION)?;
    same_type_as_start(event, names::DTEND)?;
    same_type_as_start(event, names::RECURRENCE_ID)?;

    if event.value(names::DTSTART).is_some_and(is_date)
        && event
            .value(names::DURATION)
            .and_then(Value::as_duration)
            .is_some_and(|d| !d.is_whole_days())
    {
        return Err(ValidationError::DurationNotWholeDays {
            component: event.name.clone(),
        });
    }
    Ok(())
}

fn check_todo(todo: &Component) -> Result<(), ValidationError> {
    exclusive(todo, names::DUE, names::DURATION)?;
    same_type_as_start(todo, names::DUE)?;
    same_type_as_start(todo, names::RECURRENCE_ID)?;
    if todo.has_property(names::DURATION) && !todo.has_property(names::DTSTART) {
        return Err(ValidationError::MissingProperty {
            component: todo.name.clone(),
            property: names::DTSTART,
        });
    }
    Ok(())
}

fn check_timezone(timezone: &Component) -> Result<(), ValidationError> {
    let has_observance = timezone
        .children
        .iter()
        .any(|c| matches!(c.kind, ComponentKind::Standard | ComponentKind::Daylight));
    if has_observance {
        Ok(())
    } else {
        Err(ValidationError::MissingObservance)
    }
}

fn is_local(value: &Value) -> bool {
    value.items().all(|item| match item {
        Value::DateTime(dt) => dt.is_floating(),
        Value::Period(p) => p.start().is_floating(),
        _ => true,
    })
}

fn check_observance(observance: &Component) -> Result<(), ValidationError> {
    for property in [names::DTSTART, names::RDATE] {
        if observance.get_properties(property).any(|p| !is_local(&p.value)) {
            return Err(ValidationError::NotLocal {
                component: observance.name.clone(),
                property,
            });
        }
    }
    Ok(())
}

fn check_alarm(alarm: &Component) -> Result<(), ValidationError> {
    if alarm.has_property(names::DURATION) != alarm.has_property(names::REPEAT) {
        return Err(ValidationError::AlarmRepeat);
    }

    let action = alarm
        .value(names::ACTION)
        .and_then(Value::as_text)
        .unwrap_or_default()
        .to_ascii_uppercase();
    let needs: &[&'static str] = match action.as_str() {
        "AUDIO" => {
            if alarm.count_properties(names::ATTACH) > 1 {
                return Err(ValidationError::AlarmAttach);
            }
            &[]
        }
        "DISPLAY" => &[names::DESCRIPTION],
        "EMAIL" => &[names::DESCRIPTION, names::SUMMARY, names::ATTENDEE],
        _ => &[],
    };
    for &property in needs {
        if !alarm.has_property(property) {
            return Err(ValidationError::AlarmAction {
                action,
                property,
            });
        }
    }
    Ok(())
}

/// Recurrence-set rules across the calendar's direct children.
fn check_calendar(calendar: &Component) -> Result<(), ValidationError> {
    if !calendar.has_property(names::METHOD)
        && calendar
            .children_of_kind(ComponentKind::Event)
            .any(|e| !e.has_property(names::DTSTART))
    {
        return Err(ValidationError::MissingProperty {
            component: ComponentKind::Event.to_string(),
            property: names::DTSTART,
        });
    }

    let mut bases: HashMap<(ComponentKind, &str), &Component> = HashMap::new();
    for child in calendar.children.iter().filter(|c| !c.is_override()) {
        let Some(uid) = child.uid() else { continue };
        if bases.insert((child.kind, uid), child).is_some() {
            return Err(ValidationError::MultipleBases {
                component: child.name.clone(),
                uid: uid.to_string(),
            });
        }
    }

    for child in calendar.children.iter().filter(|c| c.is_override()) {
        let Some(uid) = child.uid() else { continue };
        let Some(base) = bases.get(&(child.kind, uid)) else {
            continue;
        };
        let (Some(start), Some(rid)) = (
            base.value(names::DTSTART),
            child.value(names::RECURRENCE_ID),
        ) else {
            continue;
        };
        if is_date(start) != is_date(rid) {
            return Err(ValidationError::OverrideType {
                component: child.name.clone(),
                uid: uid.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::{
        DateTime, Duration, Frequency, Parameter, Property, Recur,
    };
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn event(uid: &str) -> Component {
        Component::new(ComponentKind::Event)
            .with_property(Property::text("UID", uid))
            .with_property(Property::new("DTSTAMP", Value::DateTime(DateTime::utc(at(2024, 1, 1, 0)))))
            .with_property(Property::new("DTSTART", Value::DateTime(DateTime::floating(at(2024, 1, 1, 9)))))
    }

    #[test_log::test]
    fn valid_event_passes() {
        assert_eq!(validate_component(&event("a")), Ok(()));
    }

    #[test_log::test]
    fn missing_required_only_warns() {
        let bare = Component::new(ComponentKind::Event);
        assert_eq!(validate_component(&bare), Ok(()));
    }

    #[test_log::test]
    fn key_property_missing_or_repeated() {
        let cal = Component::new(ComponentKind::Calendar).with_property(Property::text("PRODID", "x"));
        assert_eq!(
            validate_component(&cal),
            Err(ValidationError::MissingProperty {
                component: "VCALENDAR".into(),
                property: "VERSION",
            })
        );

        let ev = event("a").with_property(Property::text("SUMMARY", "1")).with_property(Property::text("SUMMARY", "2"));
        assert!(matches!(
            validate_component(&ev),
            Err(ValidationError::DuplicateProperty { property, .. }) if property == "SUMMARY"
        ));
    }

    #[test_log::test]
    fn registered_property_outside_schema() {
        let ev = event("a").with_property(Property::new("DUE", Value::DateTime(DateTime::floating(at(2024, 1, 2, 9)))));
        assert!(matches!(
            validate_component(&ev),
            Err(ValidationError::UnexpectedProperty { property, .. }) if property == "DUE"
        ));
        let ev = event("a").with_property(Property::text("X-ANYTHING", "ok"));
        assert_eq!(validate_component(&ev), Ok(()));
    }

    #[test_log::test]
    fn event_end_rules() {
        let ev = event("a")
            .with_property(Property::new("DTEND", Value::DateTime(DateTime::floating(at(2024, 1, 1, 10)))))
            .with_property(Property::new("DURATION", Value::Duration(Duration::hms(1, 0, 0))));
        assert!(matches!(validate_component(&ev), Err(ValidationError::Conflict { .. })));

        let ev = event("a").with_property(Property::new("DTEND", Value::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())));
        assert!(matches!(
            validate_component(&ev),
            Err(ValidationError::TypeMismatch { property: "DTEND", .. })
        ));

        let all_day = Component::new(ComponentKind::Event)
            .with_property(Property::new("DTSTART", Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())))
            .with_property(Property::new("DURATION", Value::Duration(Duration::hms(2, 0, 0))));
        assert!(matches!(
            validate_component(&all_day),
            Err(ValidationError::DurationNotWholeDays { .. })
        ));
    }

    #[test_log::test]
    fn todo_due_and_duration_conflict() {
        let todo = Component::new(ComponentKind::Todo)
            .with_property(Property::new("DTSTART", Value::DateTime(DateTime::floating(at(2024, 1, 1, 9)))))
            .with_property(Property::new("DUE", Value::DateTime(DateTime::floating(at(2024, 1, 1, 10)))))
            .with_property(Property::new("DURATION", Value::Duration(Duration::hms(1, 0, 0))));
        assert!(matches!(
            validate_component(&todo),
            Err(ValidationError::Conflict { first: "DUE", second: "DURATION", .. })
        ));
    }

    #[test_log::test]
    fn rrule_needs_frequency() {
        let ev = event("a").with_property(Property::new("RRULE", Value::Recur(Box::default())));
        assert_eq!(
            validate_component(&ev),
            Err(ValidationError::MissingFrequency { property: "RRULE" })
        );
        let ev = event("a")
            .with_property(Property::new("RRULE", Value::Recur(Box::new(Recur::new(Frequency::Daily)))))
            .with_property(Property::new("RRULE", Value::Recur(Box::new(Recur::new(Frequency::Weekly)))));
        assert_eq!(validate_component(&ev), Ok(()));
    }

    #[test_log::test]
    fn timezone_rules() {
        let tz = Component::new(ComponentKind::Timezone).with_property(Property::text("TZID", "X"));
        assert_eq!(validate_component(&tz), Err(ValidationError::MissingObservance));

        let std = Component::new(ComponentKind::Standard)
            .with_property(Property::new("DTSTART", Value::DateTime(DateTime::utc(at(1970, 1, 1, 0)))))
            .with_property(Property::new("TZOFFSETFROM", Value::UtcOffset(crate::rfc::ical::core::UtcOffset::UTC)))
            .with_property(Property::new("TZOFFSETTO", Value::UtcOffset(crate::rfc::ical::core::UtcOffset::UTC)));
        assert!(matches!(
            validate_component(&std),
            Err(ValidationError::NotLocal { property: "DTSTART", .. })
        ));
    }

    #[test_log::test]
    fn alarm_rules() {
        let alarm = Component::new(ComponentKind::Alarm)
            .with_property(Property::text("ACTION", "DISPLAY"))
            .with_property(Property::new("TRIGGER", Value::Duration(Duration::hms(0, 15, 0).negate())));
        assert_eq!(
            validate_component(&alarm),
            Err(ValidationError::AlarmAction {
                action: "DISPLAY".into(),
                property: "DESCRIPTION",
            })
        );

        let alarm = alarm
            .with_property(Property::text("DESCRIPTION", "x"))
            .with_property(Property::new("REPEAT", Value::Integer(2)));
        assert_eq!(validate_component(&alarm), Err(ValidationError::AlarmRepeat));

        let audio = Component::new(ComponentKind::Alarm)
            .with_property(Property::text("ACTION", "AUDIO"))
            .with_property(Property::new("TRIGGER", Value::Duration(Duration::zero())))
            .with_property(Property::new("ATTACH", Value::Uri("a.wav".into())))
            .with_property(Property::new("ATTACH", Value::Uri("b.wav".into())));
        assert_eq!(validate_component(&audio), Err(ValidationError::AlarmAttach));
    }

    fn calendar(children: Vec<Component>) -> Component {
        let mut cal = Component::new(ComponentKind::Calendar)
            .with_property(Property::text("PRODID", "x"))
            .with_property(Property::text("VERSION", "2.0"));
        cal.children = children;
        cal
    }

    #[test_log::test]
    fn calendar_recurrence_sets() {
        let cal = calendar(vec![event("a"), event("a")]);
        assert!(matches!(
            validate_component(&cal),
            Err(ValidationError::MultipleBases { uid, .. }) if uid == "a"
        ));

        let override_ = event("a").with_property(
            Property::new("RECURRENCE-ID", Value::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()))
                .with_param(Parameter::value_type("DATE")),
        );
        let cal = calendar(vec![event("a"), override_]);
        assert!(matches!(
            validate_component(&cal),
            Err(ValidationError::TypeMismatch { .. } | ValidationError::OverrideType { .. })
        ));
    }

    #[test_log::test]
    fn event_without_start_needs_method() {
        let no_start = Component::new(ComponentKind::Event).with_property(Property::text("UID", "a"));
        let cal = calendar(vec![no_start.clone()]);
        assert!(matches!(
            validate_component(&cal),
            Err(ValidationError::MissingProperty { property: "DTSTART", .. })
        ));
        let cal = calendar(vec![no_start]).with_property(Property::text("METHOD", "REQUEST"));
        assert_eq!(validate_component(&cal), Ok(()));
    }

    #[test_log::test]
    fn tree_collects_every_issue() {
        let bad_tz = Component::new(ComponentKind::Timezone).with_property(Property::text("TZID", "X"));
        let bad_event = event("b").with_property(Property::text("SUMMARY", "1")).with_property(Property::text("SUMMARY", "2"));
        let errors = validate_tree(&calendar(vec![bad_tz, bad_event]));
        assert_eq!(errors.len(), 2);
    }
}
