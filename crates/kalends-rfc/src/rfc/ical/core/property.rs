//! iCalendar property and content line types (RFC 5545 §3.1, §3.8).

use super::{Parameter, RecurrenceRange, TriggerRelated, Value};

/// A tokenized content line: `NAME;PARAM=VALUE:raw value`.
///
/// Transient: produced by the lexer and consumed by the tree builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Raw value string (after unfolding, before unescaping).
    pub raw_value: String,
}

impl ContentLine {
    /// Creates a content line with parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<Parameter>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params,
            raw_value: value.into(),
        }
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        find_param(&self.params, name).and_then(Parameter::value)
    }
}

fn find_param<'a>(params: &'a [Parameter], name: &str) -> Option<&'a Parameter> {
    params.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// A typed iCalendar property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Typed value.
    pub value: Value,
}

impl Property {
    /// Creates a property without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value,
        }
    }

    /// Creates a property with a text value.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, Value::Text(value.into()))
    }

    /// Adds a parameter, builder style.
    #[must_use]
    pub fn with_param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Returns the parameter with the given name.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        find_param(&self.params, name)
    }

    /// Returns the first value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.get_param(name).and_then(Parameter::value)
    }

    /// Replaces (or adds) a parameter.
    pub fn set_param(&mut self, param: Parameter) {
        self.params.retain(|p| p.name != param.name);
        self.params.push(param);
    }

    /// Removes every parameter with the given name.
    pub fn remove_param(&mut self, name: &str) {
        self.params.retain(|p| !p.name.eq_ignore_ascii_case(name));
    }

    /// Returns the RANGE parameter of a RECURRENCE-ID.
    #[must_use]
    pub fn range(&self) -> Option<RecurrenceRange> {
        self.get_param_value("RANGE").and_then(RecurrenceRange::parse)
    }

    /// Returns the RELATED parameter of a TRIGGER (default START).
    #[must_use]
    pub fn related(&self) -> TriggerRelated {
        self.get_param_value("RELATED")
            .and_then(TriggerRelated::parse)
            .unwrap_or_default()
    }

    /// Returns the value as text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_text()
    }
}

/// Property names used by the engine.
pub mod names {
    pub const CALSCALE: &str = "CALSCALE";
    pub const METHOD: &str = "METHOD";
    pub const PRODID: &str = "PRODID";
    pub const VERSION: &str = "VERSION";

    pub const ATTACH: &str = "ATTACH";
    pub const ATTENDEE: &str = "ATTENDEE";
    pub const DESCRIPTION: &str = "DESCRIPTION";
    pub const SUMMARY: &str = "SUMMARY";

    pub const COMPLETED: &str = "COMPLETED";
    pub const CREATED: &str = "CREATED";
    pub const DTEND: &str = "DTEND";
    pub const DUE: &str = "DUE";
    pub const DTSTAMP: &str = "DTSTAMP";
    pub const DTSTART: &str = "DTSTART";
    pub const DURATION: &str = "DURATION";
    pub const FREEBUSY: &str = "FREEBUSY";

    pub const TZID: &str = "TZID";
    pub const TZNAME: &str = "TZNAME";
    pub const TZOFFSETFROM: &str = "TZOFFSETFROM";
    pub const TZOFFSETTO: &str = "TZOFFSETTO";

    pub const RECURRENCE_ID: &str = "RECURRENCE-ID";
    pub const UID: &str = "UID";

    pub const EXDATE: &str = "EXDATE";
    pub const EXRULE: &str = "EXRULE";
    pub const RDATE: &str = "RDATE";
    pub const RRULE: &str = "RRULE";

    pub const ACTION: &str = "ACTION";
    pub const REPEAT: &str = "REPEAT";
    pub const TRIGGER: &str = "TRIGGER";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_line_get_param() {
        let cl = ContentLine::new(
            "dtstart",
            vec![Parameter::tzid("America/New_York")],
            "20260123T120000",
        );
        assert_eq!(cl.name, "DTSTART");
        assert_eq!(cl.get_param_value("tzid"), Some("America/New_York"));
        assert_eq!(cl.get_param_value("VALUE"), None);
    }

    #[test]
    fn property_params() {
        let mut prop = Property::text("RECURRENCE-ID", "x")
            .with_param(Parameter::new("RANGE", "THISANDFUTURE"));
        assert_eq!(prop.range(), Some(RecurrenceRange::ThisAndFuture));
        prop.set_param(Parameter::new("RANGE", "THISANDPRIOR"));
        assert_eq!(prop.params.len(), 1);
        assert_eq!(prop.range(), Some(RecurrenceRange::ThisAndPrior));
        prop.remove_param("range");
        assert!(prop.params.is_empty());
    }

    #[test]
    fn trigger_related_defaults_to_start() {
        let prop = Property::text("TRIGGER", "-PT15M");
        assert_eq!(prop.related(), TriggerRelated::Start);
        let prop = prop.with_param(Parameter::new("RELATED", "END"));
        assert_eq!(prop.related(), TriggerRelated::End);
    }
}
