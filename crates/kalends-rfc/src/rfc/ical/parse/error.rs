//! iCalendar parsing error types.

use std::fmt;

/// Result type for iCalendar parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Error type for iCalendar parsing.
///
/// The same type carries fatal errors and the tolerated diagnostics that the
/// parser collects while it keeps going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Kind of error.
    pub kind: ParseErrorKind,
    /// Line number where the error occurred (1-based).
    pub line: usize,
    /// Column number where the error occurred (1-based).
    pub column: usize,
    /// Additional context about the error.
    pub context: Option<String>,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Moves the error to another line, keeping the column.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}", self.kind, self.line, self.column)?;
        if let Some(ref ctx) = self.context {
            write!(f, ": {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Kinds of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Content line without a usable shape (e.g. `BEGIN:` with no name).
    InvalidContentLine,
    /// Missing property name.
    MissingPropertyName,
    /// Invalid property name character.
    InvalidPropertyName,
    /// Missing colon separator.
    MissingColon,
    /// Invalid parameter format.
    InvalidParameter,
    /// Unclosed quoted string.
    UnclosedQuote,
    /// Invalid date format.
    InvalidDate,
    /// Invalid time format.
    InvalidTime,
    /// Invalid date-time format.
    InvalidDateTime,
    /// Invalid duration format.
    InvalidDuration,
    /// Invalid recurrence rule.
    InvalidRecur,
    /// Recurrence rule without FREQ.
    MissingFrequency,
    /// Invalid frequency.
    InvalidFrequency,
    /// Invalid weekday.
    InvalidWeekday,
    /// Invalid UTC offset format.
    InvalidUtcOffset,
    /// Invalid boolean value.
    InvalidBoolean,
    /// Invalid integer value.
    InvalidInteger,
    /// Invalid float value.
    InvalidFloat,
    /// Invalid period format.
    InvalidPeriod,
    /// Invalid base64 payload.
    InvalidBinary,
    /// No accepted value type parsed the property value.
    InvalidValue,
    /// BEGIN line carrying parameters.
    ComponentParameter,
    /// Property or component outside a VCALENDAR.
    OutsideComponent,
    /// Invalid component nesting.
    InvalidNesting,
    /// Mismatched BEGIN/END.
    MismatchedComponent,
    /// Missing END line.
    MissingEnd,
    /// Input without any VCALENDAR.
    MissingCalendar,
    /// A finished component failed validation.
    ValidationFailed,
    /// Reading the input failed.
    Io,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidContentLine => write!(f, "invalid content line format"),
            Self::MissingPropertyName => write!(f, "missing property name"),
            Self::InvalidPropertyName => write!(f, "invalid property name"),
            Self::MissingColon => write!(f, "missing colon separator"),
            Self::InvalidParameter => write!(f, "invalid parameter format"),
            Self::UnclosedQuote => write!(f, "unclosed quoted string"),
            Self::InvalidDate => write!(f, "invalid date format"),
            Self::InvalidTime => write!(f, "invalid time format"),
            Self::InvalidDateTime => write!(f, "invalid date-time format"),
            Self::InvalidDuration => write!(f, "invalid duration format"),
            Self::InvalidRecur => write!(f, "invalid recurrence rule"),
            Self::MissingFrequency => write!(f, "recurrence rule without FREQ"),
            Self::InvalidFrequency => write!(f, "invalid frequency"),
            Self::InvalidWeekday => write!(f, "invalid weekday"),
            Self::InvalidUtcOffset => write!(f, "invalid UTC offset format"),
            Self::InvalidBoolean => write!(f, "invalid boolean value"),
            Self::InvalidInteger => write!(f, "invalid integer value"),
            Self::InvalidFloat => write!(f, "invalid float value"),
            Self::InvalidPeriod => write!(f, "invalid period format"),
            Self::InvalidBinary => write!(f, "invalid base64 value"),
            Self::InvalidValue => write!(f, "invalid property value"),
            Self::ComponentParameter => write!(f, "component takes no parameters"),
            Self::OutsideComponent => write!(f, "content outside VCALENDAR"),
            Self::InvalidNesting => write!(f, "invalid component nesting"),
            Self::MismatchedComponent => write!(f, "END does not match BEGIN"),
            Self::MissingEnd => write!(f, "missing END line"),
            Self::MissingCalendar => write!(f, "no VCALENDAR found"),
            Self::ValidationFailed => write!(f, "component validation failed"),
            Self::Io => write!(f, "input read error"),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
