//! Timezone resolution for TZID references.
//!
//! A calendar's own VTIMEZONE definitions come first; anything else goes to
//! `chrono-tz`, after ICU4X has mapped Windows zone names and IANA aliases to
//! canonical IANA identifiers.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveDateTime, Offset, TimeZone};
use chrono_tz::{OffsetComponents, OffsetName, Tz};
use icu::time::zone::iana::{IanaParserExtended, IanaParserExtendedBorrowed};
use icu::time::zone::{WindowsParser, WindowsParserBorrowed};

use super::instant::external_to_utc;
use super::vtimezone::{OffsetInfo, Timezone};
use crate::rfc::ical::core::UtcOffset;

/// The VTIMEZONE definitions of one calendar, keyed by TZID.
///
/// Built once per parsed VCALENDAR and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimezoneTable {
    zones: BTreeMap<String, Timezone>,
}

/// What a TZID resolved to.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedZone<'a> {
    /// A VTIMEZONE of the calendar.
    Local(&'a Timezone),
    /// A zone of the external database.
    External(Tz),
    Unresolved,
}

impl TimezoneTable {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            zones: BTreeMap::new(),
        }
    }

    /// Adds a definition. A TZID already present is replaced.
    pub fn register(&mut self, timezone: Timezone) {
        self.zones.insert(timezone.tzid().to_string(), timezone);
    }

    #[must_use]
    pub fn get(&self, tzid: &str) -> Option<&Timezone> {
        self.zones.get(tzid)
    }

    #[must_use]
    pub fn contains(&self, tzid: &str) -> bool {
        self.zones.contains_key(tzid)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Iterates the definitions in TZID order.
    pub fn timezones(&self) -> impl Iterator<Item = &Timezone> {
        self.zones.values()
    }

    /// Resolves a TZID.
    ///
    /// A TZID starting with `/` is a globally unique reference and only goes
    /// to the external database. Others try the table first.
    #[must_use]
    pub fn resolve(&self, tzid: &str) -> ResolvedZone<'_> {
        if !tzid.starts_with('/')
            && let Some(tz) = self.zones.get(tzid)
        {
            return ResolvedZone::Local(tz);
        }
        resolve_external(tzid).map_or(ResolvedZone::Unresolved, ResolvedZone::External)
    }
}

impl ResolvedZone<'_> {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    /// Converts wall-clock time in this zone to UTC.
    #[must_use]
    pub fn local_to_utc(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::Local(tz) => tz.local_to_utc(local),
            Self::External(tz) => external_to_utc(*tz, local),
            Self::Unresolved => None,
        }
    }

    /// Converts UTC to wall-clock time in this zone.
    #[must_use]
    pub fn utc_to_local(&self, utc: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::Local(tz) => tz.utc_to_local(utc),
            Self::External(tz) => Some(tz.from_utc_datetime(&utc).naive_local()),
            Self::Unresolved => None,
        }
    }

    /// Returns the offset, abbreviation and DST flag in effect at a UTC value.
    #[must_use]
    pub fn offset_at_utc(&self, utc: NaiveDateTime) -> Option<OffsetInfo> {
        match self {
            Self::Local(tz) => Some(tz.offset_at_utc(utc)),
            Self::External(tz) => {
                let offset = tz.offset_from_utc_datetime(&utc);
                Some(OffsetInfo {
                    offset: UtcOffset::from_seconds(offset.fix().local_minus_utc()),
                    name: offset.abbreviation().map(str::to_string),
                    is_dst: !offset.dst_offset().is_zero(),
                })
            }
            Self::Unresolved => None,
        }
    }
}

/// Looks a TZID up in the external database after normalisation.
#[must_use]
pub fn resolve_external(tzid: &str) -> Option<Tz> {
    let normalized = normalize_tzid(tzid);
    let tz = Tz::from_str(&normalized).ok();
    if tz.is_none() {
        tracing::debug!(tzid, normalized, "TZID not in the timezone database");
    }
    tz
}

static WINDOWS: LazyLock<WindowsParserBorrowed<'static>> = LazyLock::new(WindowsParser::new);
static IANA: LazyLock<IanaParserExtendedBorrowed<'static>> =
    LazyLock::new(IanaParserExtended::new);

/// Normalizes common calendar TZID spellings to IANA names.
///
/// Vendor prefixes are stripped, Windows zone names are mapped through ICU4X
/// and IANA aliases are canonicalized. Unknown names come back unchanged.
#[must_use]
pub fn normalize_tzid(tzid: &str) -> String {
    let stripped = tzid
        .strip_prefix("/mozilla.org/")
        .or_else(|| tzid.strip_prefix("/softwarestudio.org/"))
        .or_else(|| tzid.strip_prefix("/citadel.org/"))
        .unwrap_or(tzid);
    let stripped = stripped.trim_start_matches('/');

    if let Some(tz) = WINDOWS.parse(stripped, None) {
        for entry in IANA.iter() {
            if entry.time_zone == tz {
                return entry.canonical.to_string();
            }
        }
    }

    let parsed = IANA.parse(stripped);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    stripped.to_string()
}
