//! Tests for iCalendar parse errors.

use super::*;

#[test]
fn test_parse_error_new() {
    let error = ParseError::new(ParseErrorKind::MissingEnd, 10, 5);
    assert_eq!(error.kind, ParseErrorKind::MissingEnd);
    assert_eq!(error.line, 10);
    assert_eq!(error.column, 5);
    assert!(error.context.is_none());
}

#[test]
fn test_parse_error_with_context_and_line() {
    let error = ParseError::new(ParseErrorKind::InvalidDate, 3, 2)
        .with_context("expected YYYYMMDD")
        .at_line(9);

    assert_eq!(error.kind, ParseErrorKind::InvalidDate);
    assert_eq!(error.line, 9);
    assert_eq!(error.column, 2);
    assert_eq!(error.context.as_deref(), Some("expected YYYYMMDD"));
}

#[test]
fn test_parse_error_display() {
    let error = ParseError::new(ParseErrorKind::MissingColon, 1, 10);
    let display = format!("{error}");
    assert!(display.contains("missing colon separator"));
    assert!(display.contains("line 1"));
    assert!(display.contains("column 10"));
}

#[test]
fn test_parse_error_display_with_context() {
    let error = ParseError::new(ParseErrorKind::InvalidValue, 5, 15)
        .with_context("DATE-TIME: invalid date-time format");
    let display = format!("{error}");
    assert!(display.contains("invalid property value"));
    assert!(display.contains("line 5"));
    assert!(display.contains("DATE-TIME: invalid date-time format"));
}

#[test]
fn test_error_kinds_display() {
    let kinds = [
        (ParseErrorKind::InvalidContentLine, "invalid content line format"),
        (ParseErrorKind::UnclosedQuote, "unclosed quoted string"),
        (ParseErrorKind::InvalidRecur, "invalid recurrence rule"),
        (ParseErrorKind::MissingFrequency, "recurrence rule without FREQ"),
        (ParseErrorKind::InvalidBinary, "invalid base64 value"),
        (ParseErrorKind::ComponentParameter, "component takes no parameters"),
        (ParseErrorKind::OutsideComponent, "content outside VCALENDAR"),
        (ParseErrorKind::MismatchedComponent, "END does not match BEGIN"),
        (ParseErrorKind::MissingEnd, "missing END line"),
        (ParseErrorKind::ValidationFailed, "component validation failed"),
        (ParseErrorKind::Io, "input read error"),
    ];

    for (kind, expected) in kinds {
        let display = format!("{kind}");
        assert_eq!(display, expected, "Mismatch for {kind:?}");
    }
}

#[test]
fn test_parse_error_is_error_trait() {
    let error = ParseError::new(ParseErrorKind::InvalidFloat, 2, 3);
    let _: &dyn std::error::Error = &error;
}

#[test]
fn test_parse_error_clone_eq() {
    let original =
        ParseError::new(ParseErrorKind::InvalidRecur, 7, 8).with_context("BYHOUR out of range");
    assert_eq!(original.clone(), original);
}
