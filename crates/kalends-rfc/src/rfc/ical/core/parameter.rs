//! iCalendar parameter types (RFC 5545 §3.2).

use std::fmt;

/// Parameters whose values are URIs or display names and are always quoted.
pub const QUOTED_PARAMETERS: &[&str] = &[
    "ALTREP",
    "CN",
    "DELEGATED-FROM",
    "DELEGATED-TO",
    "DIR",
    "MEMBER",
    "SENT-BY",
];

/// A single iCalendar property parameter.
///
/// For example, in `DTSTART;TZID=America/New_York:20260123T120000` the
/// parameter has name `TZID` and the single value `America/New_York`.
/// Values are stored decoded: no surrounding quotes, no caret escapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    /// Parameter name (normalized to uppercase).
    pub name: String,
    /// Parameter values. Most parameters have one value, but some
    /// (like MEMBER) can have multiple comma-separated values.
    pub values: Vec<String>,
}

impl Parameter {
    /// Creates a new parameter with a single value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values: vec![value.into()],
        }
    }

    /// Creates a new parameter with multiple values.
    #[must_use]
    pub fn with_values(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values,
        }
    }

    /// Returns the first (and usually only) value.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Returns whether the parameter has the specified value (case-insensitive).
    #[must_use]
    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.eq_ignore_ascii_case(value))
    }

    /// Returns true if values of this parameter are always written quoted.
    #[must_use]
    pub fn requires_quotes(&self) -> bool {
        QUOTED_PARAMETERS.contains(&self.name.as_str())
    }

    /// Creates a TZID parameter.
    #[must_use]
    pub fn tzid(tzid: impl Into<String>) -> Self {
        Self::new("TZID", tzid)
    }

    /// Creates a VALUE parameter.
    #[must_use]
    pub fn value_type(value_type: impl Into<String>) -> Self {
        Self::new("VALUE", value_type)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.values.is_empty() {
            return Ok(());
        }
        write!(f, "=")?;
        let always_quote = self.requires_quotes();
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            let encoded = caret_encode(value);
            if always_quote || needs_quoting(value) {
                write!(f, "\"{encoded}\"")?;
            } else {
                write!(f, "{encoded}")?;
            }
        }
        Ok(())
    }
}

/// Checks if a parameter value needs quoting.
fn needs_quoting(s: &str) -> bool {
    s.chars().any(|c| matches!(c, ':' | ';' | ','))
}

/// Applies RFC 6868 caret encoding to a parameter value.
fn caret_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '^' => out.push_str("^^"),
            '\n' => out.push_str("^n"),
            '"' => out.push_str("^'"),
            _ => out.push(c),
        }
    }
    out
}

/// RELATED parameter values for TRIGGER (RFC 5545 §3.2.14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerRelated {
    /// Relative to component start (default).
    #[default]
    Start,
    /// Relative to component end.
    End,
}

impl TriggerRelated {
    /// Parses a RELATED value; unknown values yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("START") {
            Some(Self::Start)
        } else if s.eq_ignore_ascii_case("END") {
            Some(Self::End)
        } else {
            None
        }
    }
}

/// RANGE parameter values for RECURRENCE-ID (RFC 5545 §3.2.13).
///
/// THISANDPRIOR is deprecated by RFC 5545 but still honoured when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceRange {
    /// The override applies to this and all later instances.
    ThisAndFuture,
    /// The override applies to this and all earlier instances.
    ThisAndPrior,
}

impl RecurrenceRange {
    /// Parses a RANGE value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("THISANDFUTURE") {
            Some(Self::ThisAndFuture)
        } else if s.eq_ignore_ascii_case("THISANDPRIOR") {
            Some(Self::ThisAndPrior)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_display_plain() {
        assert_eq!(Parameter::tzid("Europe/Paris").to_string(), "TZID=Europe/Paris");
    }

    #[test]
    fn parameter_display_quotes_special_chars() {
        let p = Parameter::new("X-NOTE", "a;b");
        assert_eq!(p.to_string(), "X-NOTE=\"a;b\"");
    }

    #[test]
    fn parameter_display_always_quotes_uri_params() {
        let p = Parameter::with_values(
            "MEMBER",
            vec!["mailto:a@example.com".into(), "mailto:b@example.com".into()],
        );
        assert_eq!(
            p.to_string(),
            "MEMBER=\"mailto:a@example.com\",\"mailto:b@example.com\""
        );
        assert_eq!(Parameter::new("cn", "Jane").to_string(), "CN=\"Jane\"");
    }

    #[test]
    fn parameter_display_caret_encoding() {
        let p = Parameter::new("X-ADDR", "1 \"Main\" St\nTown^");
        assert_eq!(p.to_string(), "X-ADDR=1 ^'Main^' St^nTown^^");
    }

    #[test]
    fn range_and_related_parse() {
        assert_eq!(
            RecurrenceRange::parse("thisandfuture"),
            Some(RecurrenceRange::ThisAndFuture)
        );
        assert_eq!(RecurrenceRange::parse("bogus"), None);
        assert_eq!(TriggerRelated::parse("END"), Some(TriggerRelated::End));
    }
}
