//! iCalendar document parser (RFC 5545).
//!
//! A BEGIN/END stack machine over unfolded content lines. Line, property and
//! validation problems are collected as diagnostics and parsing goes on; only
//! a stream that ends inside a component is fatal. With
//! [`ParseOptions::strict`] the first diagnostic is returned as the error.

use std::io::BufRead;
use std::sync::Arc;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{Unfolder, parse_content_line};
use super::registry::parse_property_value;
use crate::rfc::ical::core::{
    Calendar, Component, ComponentKind, ContentLine, DateTimeForm, Period, Property, Value,
};
use crate::rfc::ical::expand::{FloatingZone, Timezone, TimezoneTable};
use crate::rfc::ical::query::check_overrides;
use crate::rfc::ical::validate::validate_component;

/// Parser settings.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Turn the first diagnostic into a hard error.
    pub strict: bool,
    /// Zone used for floating values when checking overrides.
    pub floating: FloatingZone,
}

/// Output of a lenient parse.
#[derive(Debug, Clone)]
pub struct Parsed {
    /// Every top-level VCALENDAR, in input order.
    pub calendars: Vec<Calendar>,
    /// Tolerated problems, in input order.
    pub diagnostics: Vec<ParseError>,
}

/// Parses a document and returns its first VCALENDAR.
///
/// ## Errors
/// Returns an error if the stream ends inside a component or holds no
/// VCALENDAR.
pub fn parse(input: &str) -> ParseResult<Calendar> {
    let parsed = parse_with(input, &ParseOptions::default())?;
    parsed
        .calendars
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingCalendar, 1, 1))
}

/// Parses a document held in memory.
///
/// ## Errors
/// Returns an error if the stream ends inside a component, or on the first
/// diagnostic in strict mode.
pub fn parse_with(input: &str, options: &ParseOptions) -> ParseResult<Parsed> {
    parse_lines(input.split('\n'), options)
}

/// Parses from a buffered reader, decoding lines as UTF-8 (lossy).
///
/// ## Errors
/// Returns [`ParseErrorKind::Io`] if reading fails, otherwise as
/// [`parse_with`].
pub fn parse_reader<R: BufRead>(reader: R, options: &ParseOptions) -> ParseResult<Parsed> {
    let mut io_error = None;
    let lines = reader.split(b'\n').map_while(|chunk| match chunk {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            io_error = Some(e);
            None
        }
    });
    let parsed = parse_lines(lines, options);
    if let Some(e) = io_error {
        return Err(ParseError::new(ParseErrorKind::Io, 0, 0).with_context(e.to_string()));
    }
    parsed
}

/// Parses any sequence of physical lines.
///
/// ## Errors
/// Returns an error if the stream ends inside a component, or on the first
/// diagnostic in strict mode.
#[tracing::instrument(skip(lines, options), fields(strict = options.strict))]
pub fn parse_lines<I, S>(lines: I, options: &ParseOptions) -> ParseResult<Parsed>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = Builder::new(options);
    let mut last_line = 0;

    for (line, line_num) in Unfolder::new(lines.into_iter()) {
        last_line = line_num;
        match parse_content_line(&line, line_num) {
            Ok(content_line) => builder.feed(content_line, line_num)?,
            Err(e) => builder.report(e)?,
        }
    }

    if let Some(open) = builder.stack.last() {
        return Err(ParseError::new(ParseErrorKind::MissingEnd, last_line, 1)
            .with_context(format!("missing END:{}", open.name)));
    }

    tracing::debug!(
        calendars = builder.calendars.len(),
        diagnostics = builder.diagnostics.len(),
        "parsed iCalendar stream"
    );
    Ok(Parsed {
        calendars: builder.calendars,
        diagnostics: builder.diagnostics,
    })
}

struct Builder<'o> {
    options: &'o ParseOptions,
    stack: Vec<Component>,
    timezones: TimezoneTable,
    calendars: Vec<Calendar>,
    diagnostics: Vec<ParseError>,
}

impl<'o> Builder<'o> {
    fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            stack: Vec::new(),
            timezones: TimezoneTable::default(),
            calendars: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn report(&mut self, err: ParseError) -> ParseResult<()> {
        tracing::warn!(%err, "iCalendar diagnostic");
        if self.options.strict {
            return Err(err);
        }
        self.diagnostics.push(err);
        Ok(())
    }

    fn feed(&mut self, line: ContentLine, line_num: usize) -> ParseResult<()> {
        match line.name.as_str() {
            "BEGIN" => self.begin(&line, line_num),
            "END" => self.end(&line, line_num),
            _ => self.property(line, line_num),
        }
    }

    fn begin(&mut self, line: &ContentLine, line_num: usize) -> ParseResult<()> {
        let name = line.raw_value.trim().to_ascii_uppercase();
        if name.is_empty() {
            return self.report(
                ParseError::new(ParseErrorKind::InvalidContentLine, line_num, 1)
                    .with_context("BEGIN without a component name"),
            );
        }
        if !line.params.is_empty() {
            self.report(
                ParseError::new(ParseErrorKind::ComponentParameter, line_num, 1)
                    .with_context(format!("BEGIN:{name}")),
            )?;
        }

        let component = Component::named(name);
        match (self.stack.is_empty(), component.kind) {
            (true, ComponentKind::Calendar) => self.timezones = TimezoneTable::default(),
            (true, _) => self.report(
                ParseError::new(ParseErrorKind::OutsideComponent, line_num, 1)
                    .with_context(format!("BEGIN:{} is dropped", component.name)),
            )?,
            (false, ComponentKind::Calendar) => self.report(
                ParseError::new(ParseErrorKind::InvalidNesting, line_num, 1)
                    .with_context("nested VCALENDAR"),
            )?,
            (false, _) => {}
        }
        self.stack.push(component);
        Ok(())
    }

    fn end(&mut self, line: &ContentLine, line_num: usize) -> ParseResult<()> {
        let name = line.raw_value.trim().to_ascii_uppercase();
        let open = self.stack.last().map(|c| c.name.as_str());
        if open != Some(name.as_str()) {
            let expected = open.unwrap_or("nothing").to_string();
            return self.report(
                ParseError::new(ParseErrorKind::MismatchedComponent, line_num, 1)
                    .with_context(format!("END:{name} while {expected} is open")),
            );
        }
        let Some(component) = self.stack.pop() else {
            return Ok(());
        };

        if let Err(e) = validate_component(&component) {
            self.report(
                ParseError::new(ParseErrorKind::ValidationFailed, line_num, 1)
                    .with_context(e.to_string()),
            )?;
        }
        if component.kind == ComponentKind::Timezone {
            self.register_timezone(&component, line_num)?;
        }

        if let Some(parent) = self.stack.last_mut() {
            parent.add_child(component);
        } else if component.kind == ComponentKind::Calendar {
            let mut component = component;
            float_unresolved(&mut component, &self.timezones);
            let timezones = Arc::new(std::mem::take(&mut self.timezones));
            let calendar = Calendar::from_parts(component, timezones);
            for issue in check_overrides(&calendar, self.options.floating) {
                self.report(
                    ParseError::new(ParseErrorKind::ValidationFailed, line_num, 1)
                        .with_context(issue.to_string()),
                )?;
            }
            self.calendars.push(calendar);
        }
        Ok(())
    }

    fn register_timezone(&mut self, component: &Component, line_num: usize) -> ParseResult<()> {
        match Timezone::from_component(component) {
            Ok(tz) => {
                if self.timezones.contains(tz.tzid()) {
                    tracing::debug!(tzid = tz.tzid(), "VTIMEZONE already registered");
                } else {
                    self.timezones.register(tz);
                }
                Ok(())
            }
            Err(e) => self.report(
                ParseError::new(ParseErrorKind::ValidationFailed, line_num, 1)
                    .with_context(e.to_string()),
            ),
        }
    }

    /// A TZID parameter makes the value zoned. Whether the zone resolves is
    /// settled once the whole VCALENDAR and its VTIMEZONEs are read.
    fn form_for(line: &ContentLine) -> DateTimeForm {
        line.get_param_value("TZID")
            .map_or(DateTimeForm::Floating, |tzid| DateTimeForm::Zoned {
                tzid: tzid.to_string(),
            })
    }

    fn property(&mut self, line: ContentLine, line_num: usize) -> ParseResult<()> {
        if self.stack.is_empty() {
            return self.report(
                ParseError::new(ParseErrorKind::OutsideComponent, line_num, 1)
                    .with_context(format!("property {} has no component", line.name)),
            );
        }

        let form = Self::form_for(&line);
        let col = line.name.len() + 2;
        let value = match parse_property_value(
            &line.name,
            &line.raw_value,
            &line.params,
            &form,
            line_num,
            col,
        ) {
            Ok(value) => value,
            Err(e) => return self.report(e),
        };

        if let Some(current) = self.stack.last_mut() {
            current.add_property(Property {
                name: line.name,
                params: line.params,
                value,
            });
        }
        Ok(())
    }
}

/// Turns zoned values whose TZID resolves neither against the calendar's
/// VTIMEZONEs nor the external database into floating values.
fn float_unresolved(component: &mut Component, timezones: &TimezoneTable) {
    for prop in &mut component.properties {
        float_value(&prop.name, &mut prop.value, timezones);
    }
    for child in &mut component.children {
        float_unresolved(child, timezones);
    }
}

fn float_value(name: &str, value: &mut Value, timezones: &TimezoneTable) {
    match value {
        Value::DateTime(dt) => float_form(name, &mut dt.form, timezones),
        Value::Time(time) => float_form(name, &mut time.form, timezones),
        Value::Period(Period::Explicit { start, end }) => {
            float_form(name, &mut start.form, timezones);
            float_form(name, &mut end.form, timezones);
        }
        Value::Period(Period::Duration { start, .. }) => {
            float_form(name, &mut start.form, timezones);
        }
        Value::List(items) => {
            for item in items {
                float_value(name, item, timezones);
            }
        }
        _ => {}
    }
}

fn float_form(name: &str, form: &mut DateTimeForm, timezones: &TimezoneTable) {
    let Some(tzid) = form.tzid() else {
        return;
    };
    if !timezones.resolve(tzid).is_resolved() {
        tracing::warn!(property = name, tzid, "unresolved TZID, value is floating");
        *form = DateTimeForm::Floating;
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
