use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, ValueEnum};

/// Parses, queries and re-serializes iCalendar files.
#[derive(Debug, Parser)]
#[command(name = "kalends", version, about)]
pub struct Cli {
    /// iCalendar file to read
    #[arg(env = "KALENDS_INPUT")]
    pub input: PathBuf,

    /// Window start, UTC (`20240101T000000Z`, `20240101T000000` or `20240101`)
    #[arg(long, value_parser = parse_utc)]
    pub start: Option<NaiveDateTime>,

    /// Window end, UTC, exclusive
    #[arg(long, value_parser = parse_utc)]
    pub end: Option<NaiveDateTime>,

    /// Only consider one component kind, such as VEVENT or VTODO
    #[arg(short, long)]
    pub component: Option<String>,

    /// How recurring components appear in the output
    #[arg(short, long, value_enum, default_value_t = Mode::AsIs)]
    pub mode: Mode,

    /// Match the window against VALARM triggers instead of the components
    #[arg(long)]
    pub alarms: bool,

    /// Zone for floating times, overriding `calendar.floating_tz`
    #[arg(long, env = "KALENDS_FLOATING_TZ")]
    pub floating_tz: Option<String>,

    /// Fail on the first parse diagnostic
    #[arg(long)]
    pub strict: bool,

    /// Convert every zoned time to UTC before printing
    #[arg(long)]
    pub utc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Return matching components unchanged
    AsIs,
    /// Return the base and overrides of sets with an instance in the window
    Limit,
    /// Return one component per instance in the window
    Expand,
}

/// Reads a UTC date-time in iCalendar basic format.
///
/// ## Errors
/// Returns a message if the text matches none of the accepted forms.
pub fn parse_utc(s: &str) -> Result<NaiveDateTime, String> {
    let trimmed = s.strip_suffix('Z').unwrap_or(s);
    NaiveDateTime::parse_from_str(trimmed, "%Y%m%dT%H%M%S")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y%m%d").map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|e| format!("invalid date-time {s:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(parse_utc("20240301T093000Z"), Ok(expected));
        assert_eq!(parse_utc("20240301T093000"), Ok(expected));
        assert_eq!(
            parse_utc("20240301"),
            Ok(expected.date().and_time(NaiveTime::MIN))
        );
        assert!(parse_utc("2024-03-01").is_err());
    }

    #[test]
    fn arguments() {
        let cli = Cli::try_parse_from([
            "kalends",
            "cal.ics",
            "--start",
            "20240101",
            "--end",
            "20240201T000000Z",
            "--mode",
            "expand",
            "-c",
            "VEVENT",
        ])
        .unwrap();
        assert_eq!(cli.input, PathBuf::from("cal.ics"));
        assert_eq!(cli.mode, Mode::Expand);
        assert_eq!(cli.component.as_deref(), Some("VEVENT"));
        assert!(cli.start.is_some() && cli.end.is_some());
        assert!(!cli.alarms);
    }
}
