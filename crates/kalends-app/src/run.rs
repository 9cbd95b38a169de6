//! Turns parsed arguments and settings into a query and runs it.

use kalends_core::config::CalendarConfig;
use kalends_rfc::error::RfcError;
use kalends_rfc::rfc::ical::core::{Calendar, ComponentKind};
use kalends_rfc::rfc::ical::expand::{ExpansionOptions, FloatingZone};
use kalends_rfc::rfc::ical::parse::{ParseOptions, parse_with};
use kalends_rfc::rfc::ical::query::{Query, RecurrenceMode, TimeRange, time_range, to_utc};
use kalends_rfc::rfc::ical::serialize;

use crate::cli::{Cli, Mode};
use crate::error::{AppError, AppResult};

/// Reads the input file and returns the serialized result.
///
/// ## Errors
/// Returns an error if the file cannot be read, the settings are unusable,
/// or parsing or the query fails.
pub fn run(cli: &Cli, calendar: &CalendarConfig) -> AppResult<String> {
    let input = std::fs::read_to_string(&cli.input).map_err(|source| AppError::Read {
        path: cli.input.display().to_string(),
        source,
    })?;
    process(&input, cli, calendar)
}

/// Parses `input`, applies the query described by `cli` to every
/// VCALENDAR and serializes the results.
///
/// ## Errors
/// Returns an error if the settings are unusable, parsing fails, or a
/// query is malformed.
#[tracing::instrument(level = "debug", skip(input, cli, calendar), fields(len = input.len()))]
pub fn process(input: &str, cli: &Cli, calendar: &CalendarConfig) -> AppResult<String> {
    calendar.check()?;
    let zone_name = cli.floating_tz.as_deref().unwrap_or(&calendar.floating_tz);
    let floating =
        FloatingZone::parse(zone_name).ok_or_else(|| AppError::UnknownZone(zone_name.to_string()))?;

    let options = ParseOptions {
        strict: cli.strict || calendar.strict,
        floating,
    };
    let parsed = parse_with(input, &options).map_err(RfcError::from)?;
    for diagnostic in &parsed.diagnostics {
        tracing::warn!(%diagnostic, "Tolerated parse problem");
    }
    if options.strict && !parsed.diagnostics.is_empty() {
        return Err(AppError::Strict(parsed.diagnostics.len()));
    }
    if parsed.calendars.is_empty() {
        return Err(AppError::NoCalendar);
    }

    let query = build_query(cli, floating, calendar.max_idle_periods)?;
    tracing::debug!(?query, "Query built");

    let mut output = String::new();
    for found in &parsed.calendars {
        let result = time_range(found, &query).map_err(RfcError::from)?;
        let result: Calendar = if cli.utc { to_utc(&result) } else { result };
        output.push_str(&serialize(&result));
    }
    Ok(output)
}

fn build_query(cli: &Cli, floating: FloatingZone, max_idle_periods: u32) -> AppResult<Query> {
    let mut query = Query::new()
        .floating(floating)
        .expansion(ExpansionOptions { max_idle_periods });
    if let Some(name) = &cli.component {
        query = query.kind(ComponentKind::parse(name));
    }

    let window = match (cli.start, cli.end) {
        (Some(start), Some(end)) => Some(TimeRange::between(start, end).map_err(RfcError::from)?),
        (Some(start), None) => Some(TimeRange::starting(start)),
        (None, Some(end)) => Some(TimeRange::ending(end)),
        (None, None) => None,
    };
    let Some(window) = window else {
        return Ok(query);
    };

    query = if cli.alarms {
        query.alarms(window)
    } else {
        query.range(window)
    };
    Ok(match cli.mode {
        Mode::AsIs => query,
        Mode::Limit => query.mode(RecurrenceMode::Limit(window)),
        Mode::Expand => query.mode(RecurrenceMode::Expand(window)),
    })
}
