//! Content line lexer for iCalendar (RFC 5545 §3.1).
//!
//! [`Unfolder`] joins folded physical lines into logical lines and
//! [`parse_content_line`] splits one logical line into name, parameters and
//! raw value.

use std::fmt;
use std::iter::{Enumerate, Peekable};

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{ContentLine, Parameter, QUOTED_PARAMETERS};

/// Iterator over logical content lines.
///
/// Yields `(line, 1-based line number of its first physical line)`. CRLF and
/// bare LF terminators are stripped; a physical line starting with SPACE or
/// HTAB continues the previous logical line with that one character removed.
/// Empty physical lines are skipped.
pub struct Unfolder<I: Iterator> {
    lines: Peekable<Enumerate<I>>,
}

impl<I: Iterator> fmt::Debug for Unfolder<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unfolder").finish_non_exhaustive()
    }
}

impl<I: Iterator> Unfolder<I> {
    /// Wraps an iterator of physical lines.
    pub fn new(lines: I) -> Self {
        Self {
            lines: lines.enumerate().peekable(),
        }
    }
}

/// Unfolds a whole document held in memory.
#[must_use]
pub fn unfold(input: &str) -> Unfolder<std::str::Split<'_, char>> {
    Unfolder::new(input.split('\n'))
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn continuation(line: &str) -> Option<&str> {
    strip_terminator(line).strip_prefix([' ', '\t'])
}

impl<I, S> Iterator for Unfolder<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = (String, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (index, first) = self.lines.next()?;
            let first = strip_terminator(first.as_ref());
            if first.is_empty() {
                continue;
            }
            let mut logical = first.to_string();
            while let Some((_, next)) = self.lines.peek() {
                let Some(rest) = continuation(next.as_ref()) else {
                    break;
                };
                logical.push_str(rest);
                self.lines.next();
            }
            return Some((logical, index + 1));
        }
    }
}

/// Parses a single content line.
///
/// Format: `name *(";" param) ":" value`
///
/// ## Errors
/// Returns an error if the name or a parameter is malformed, a quoted value
/// is unterminated, or the value separator is missing.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let mut scanner = Scanner {
        line,
        pos: 0,
        line_num,
    };

    let name = scanner.take_name();
    if name.is_empty() {
        return Err(scanner.error(ParseErrorKind::MissingPropertyName));
    }

    let mut params = Vec::new();
    loop {
        match scanner.peek() {
            Some(':') => {
                scanner.bump();
                break;
            }
            Some(';') => {
                scanner.bump();
                params.push(scanner.parameter()?);
            }
            Some(_) => return Err(scanner.error(ParseErrorKind::InvalidPropertyName)),
            None => return Err(scanner.error(ParseErrorKind::MissingColon)),
        }
    }

    Ok(ContentLine::new(name, params, scanner.rest()))
}

/// Single-pass scanner over one logical line.
struct Scanner<'a> {
    line: &'a str,
    pos: usize,
    line_num: usize,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.line_num, self.pos + 1)
    }

    /// Takes `1*(ALPHA / DIGIT / "-")`.
    fn take_name(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Parses `name "=" value *("," value)`, leaving the scanner on the
    /// following `;` or `:`.
    fn parameter(&mut self) -> ParseResult<Parameter> {
        let name = self.take_name().to_ascii_uppercase();
        if name.is_empty() || self.peek() != Some('=') {
            return Err(self.error(ParseErrorKind::InvalidParameter));
        }
        self.bump();

        let mut values = Vec::new();
        let mut unquoted = false;
        loop {
            if self.peek() == Some('"') {
                values.push(self.quoted_value()?);
            } else {
                let rest = self.rest();
                let len = rest.find([',', ';', ':', '"']).unwrap_or(rest.len());
                self.pos += len;
                values.push(decode_caret(&rest[..len]));
                unquoted = true;
            }

            match self.peek() {
                Some(',') => self.bump(),
                Some(';' | ':') => break,
                Some(c) => {
                    return Err(self
                        .error(ParseErrorKind::InvalidParameter)
                        .with_context(format!("unexpected character '{c}'")));
                }
                None => return Err(self.error(ParseErrorKind::MissingColon)),
            }
        }

        if unquoted && QUOTED_PARAMETERS.contains(&name.as_str()) {
            tracing::warn!(line = self.line_num, param = %name, "parameter value is not quoted");
        }
        Ok(Parameter::with_values(name, values))
    }

    fn quoted_value(&mut self) -> ParseResult<String> {
        let start = self.error(ParseErrorKind::UnclosedQuote);
        self.bump();
        let rest = self.rest();
        let Some(len) = rest.find('"') else {
            return Err(start);
        };
        self.pos += len + 1;
        Ok(decode_caret(&rest[..len]))
    }
}

/// Decodes RFC 6868 caret escapes: `^n` newline, `^'` DQUOTE, `^^` caret.
/// Unknown sequences are kept as written.
fn decode_caret(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '^' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n' | 'N') => {
                out.push('\n');
                chars.next();
            }
            Some('\'') => {
                out.push('"');
                chars.next();
            }
            Some('^') => {
                out.push('^');
                chars.next();
            }
            _ => out.push('^'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logical(input: &str) -> Vec<(String, usize)> {
        unfold(input).collect()
    }

    #[test]
    fn unfold_crlf_and_lf() {
        let lines = logical("SUMMARY:a\r\nDESCRIPTION:First\r\n Second\n\tThird\nUID:x\n");
        assert_eq!(
            lines,
            vec![
                ("SUMMARY:a".to_string(), 1),
                ("DESCRIPTION:FirstSecondThird".to_string(), 2),
                ("UID:x".to_string(), 5),
            ]
        );
    }

    #[test]
    fn unfold_strips_only_one_whitespace() {
        let lines = logical("DESCRIPTION:a\r\n  b");
        assert_eq!(lines[0].0, "DESCRIPTION:a b");
    }

    #[test]
    fn unfold_skips_blank_lines() {
        let lines = logical("\r\nUID:1\r\n\r\nUID:2");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], ("UID:2".to_string(), 4));
    }

    #[test]
    fn folded_line_matches_unsplit_form() {
        let folded: Vec<_> = unfold("SUMMARY:Quarterly plan\r\n ning review\r\n").collect();
        let plain: Vec<_> = unfold("SUMMARY:Quarterly planning review\r\n").collect();
        assert_eq!(folded, plain);
        let a = parse_content_line(&folded[0].0, 1).unwrap();
        let b = parse_content_line(&plain[0].0, 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unfolder_accepts_owned_lines() {
        let input = vec![String::from("UID:1\r\n"), String::from(" 23\r\n")];
        let lines: Vec<_> = Unfolder::new(input.into_iter()).collect();
        assert_eq!(lines, vec![("UID:123".to_string(), 1)]);
    }

    #[test]
    fn unfolder_debug_over_any_iterator() {
        let unfolder = Unfolder::new(["UID:1"].into_iter().map(|line| line.to_string()));
        assert_eq!(format!("{unfolder:?}"), "Unfolder { .. }");
    }

    #[test]
    fn parse_simple_line() {
        let result = parse_content_line("summary:Team Meeting", 1).unwrap();
        assert_eq!(result.name, "SUMMARY");
        assert!(result.params.is_empty());
        assert_eq!(result.raw_value, "Team Meeting");
    }

    #[test]
    fn parse_line_with_params() {
        let result =
            parse_content_line("DTSTART;TZID=America/New_York:20260123T120000", 1).unwrap();
        assert_eq!(result.name, "DTSTART");
        assert_eq!(result.params.len(), 1);
        assert_eq!(result.params[0].name, "TZID");
        assert_eq!(result.params[0].value(), Some("America/New_York"));
        assert_eq!(result.raw_value, "20260123T120000");
    }

    #[test]
    fn parse_line_with_empty_value() {
        let result = parse_content_line("X-EMPTY;X-P=1:", 1).unwrap();
        assert_eq!(result.raw_value, "");
        assert_eq!(result.get_param_value("x-p"), Some("1"));
    }

    #[test]
    fn parse_line_with_quoted_param() {
        let result =
            parse_content_line("ATTENDEE;CN=\"Doe, Jane\":mailto:jane@example.com", 1).unwrap();
        assert_eq!(result.params[0].value(), Some("Doe, Jane"));
        assert_eq!(result.raw_value, "mailto:jane@example.com");
    }

    #[test]
    fn parse_line_with_multiple_param_values() {
        let line = "ATTENDEE;ROLE=REQ-PARTICIPANT,\"OPT;PARTICIPANT\";RSVP=TRUE:mailto:t@example.com";
        let result = parse_content_line(line, 1).unwrap();
        assert_eq!(
            result.params[0].values,
            vec!["REQ-PARTICIPANT".to_string(), "OPT;PARTICIPANT".to_string()]
        );
        assert_eq!(result.get_param_value("RSVP"), Some("TRUE"));
    }

    #[test]
    fn parse_line_with_caret_encoding() {
        let line = "ATTENDEE;CN=\"Test^nName ^'Q^' ^^\";X-U=a^nb:mailto:test@example.com";
        let result = parse_content_line(line, 1).unwrap();
        assert_eq!(result.params[0].value(), Some("Test\nName \"Q\" ^"));
        assert_eq!(result.params[1].value(), Some("a\nb"));
    }

    #[test]
    fn parse_line_errors() {
        let err = parse_content_line("ATTENDEE;CN=\"Unclosed:mailto:x", 3).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedQuote);
        assert_eq!(err.line, 3);

        let err = parse_content_line("INVALID", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingColon);

        let err = parse_content_line(":value", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingPropertyName);

        let err = parse_content_line("BAD NAME:value", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPropertyName);
        assert_eq!(err.column, 4);

        let err = parse_content_line("X;NOEQUALS:value", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidParameter);

        let err = parse_content_line("X;P=\"a\"b:value", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidParameter);
    }
}
