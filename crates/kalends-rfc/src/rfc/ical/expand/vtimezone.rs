//! VTIMEZONE definitions (RFC 5545 §3.6.5).
//!
//! A definition is a set of STANDARD and DAYLIGHT observances. Each one has
//! onsets (its DTSTART, RDATEs and RRULE expansions) at which its TZOFFSETTO
//! takes effect. The onsets of all observances are merged into one ascending
//! stream and the offset in effect at a moment is that of the latest onset
//! not after it.

use chrono::{NaiveDateTime, TimeDelta};

use super::instant::{FloatingZone, Instant, TimeContext};
use super::merger::Merger;
use super::recur::{ExpansionOptions, expand};
use super::timezone::TimezoneTable;
use crate::rfc::ical::core::{Component, ComponentKind, DateTime, Recur, UtcOffset, Value, names};

/// Error reading a VTIMEZONE component.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VTimezoneError {
    #[error("expected a VTIMEZONE component, got {0}")]
    NotTimezone(String),

    #[error("VTIMEZONE has no TZID")]
    MissingTzid,

    #[error("VTIMEZONE {0} has no STANDARD or DAYLIGHT component")]
    NoObservances(String),

    #[error("missing required property {0} in {1} component")]
    MissingProperty(&'static str, &'static str),

    #[error("invalid {0} value: {1}")]
    InvalidValue(&'static str, String),
}

/// Kind of timezone observance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservanceKind {
    Standard,
    Daylight,
}

impl ObservanceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Daylight => "DAYLIGHT",
        }
    }
}

impl std::fmt::Display for ObservanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One STANDARD or DAYLIGHT sub-component.
#[derive(Debug, Clone, PartialEq)]
pub struct Observance {
    pub kind: ObservanceKind,
    /// Offset in effect before each onset.
    pub offset_from: UtcOffset,
    /// Offset in effect from each onset on.
    pub offset_to: UtcOffset,
    /// First onset, in the wall clock of `offset_from`.
    pub dtstart: NaiveDateTime,
    pub rrules: Vec<Recur>,
    /// Extra onsets, in the wall clock of `offset_from`.
    pub rdates: Vec<NaiveDateTime>,
    /// First TZNAME, if any.
    pub name: Option<String>,
}

/// The offset in effect at a moment, with its abbreviation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetInfo {
    pub offset: UtcOffset,
    pub name: Option<String>,
    pub is_dst: bool,
}

/// A parsed VTIMEZONE.
#[derive(Debug, Clone, PartialEq)]
pub struct Timezone {
    tzid: String,
    pub observances: Vec<Observance>,
    pub last_modified: Option<DateTime>,
    pub tzurl: Option<String>,
}

/// An observance taking effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Onset {
    utc: NaiveDateTime,
    local: NaiveDateTime,
    index: usize,
}

type OnsetIter<'a> = Box<dyn Iterator<Item = Onset> + 'a>;

static NO_TIMEZONES: TimezoneTable = TimezoneTable::new();

impl Observance {
    fn from_component(component: &Component) -> Result<Self, VTimezoneError> {
        let kind = match component.kind {
            ComponentKind::Daylight => ObservanceKind::Daylight,
            _ => ObservanceKind::Standard,
        };
        let label = kind.as_str();

        let offset = |name: &'static str| {
            let value = component
                .value(name)
                .ok_or(VTimezoneError::MissingProperty(name, label))?;
            value
                .as_utc_offset()
                .ok_or_else(|| VTimezoneError::InvalidValue(name, format!("{value:?}")))
        };
        let offset_from = offset(names::TZOFFSETFROM)?;
        let offset_to = offset(names::TZOFFSETTO)?;

        let dtstart = component
            .value(names::DTSTART)
            .ok_or(VTimezoneError::MissingProperty(names::DTSTART, label))?;
        let dtstart = dtstart
            .as_datetime()
            .map(|dt| dt.local)
            .ok_or_else(|| VTimezoneError::InvalidValue(names::DTSTART, format!("{dtstart:?}")))?;

        let mut rrules = Vec::new();
        for property in component.get_properties(names::RRULE) {
            let rule = property.value.as_recur().ok_or_else(|| {
                VTimezoneError::InvalidValue(names::RRULE, format!("{:?}", property.value))
            })?;
            if rule.freq().is_none() {
                return Err(VTimezoneError::InvalidValue(names::RRULE, rule.to_string()));
            }
            rrules.push(rule.clone());
        }

        let mut rdates: Vec<NaiveDateTime> = component
            .get_properties(names::RDATE)
            .flat_map(|property| property.value.items())
            .filter_map(|value| match value {
                Value::DateTime(dt) => Some(dt.local),
                Value::Period(period) => Some(period.start().local),
                _ => None,
            })
            .collect();
        rdates.sort_unstable();

        Ok(Self {
            kind,
            offset_from,
            offset_to,
            dtstart,
            rrules,
            rdates,
            name: component
                .get_property(names::TZNAME)
                .and_then(|p| p.as_text())
                .map(str::to_string),
        })
    }

    fn info(&self) -> OffsetInfo {
        OffsetInfo {
            offset: self.offset_to,
            name: self.name.clone(),
            is_dst: self.kind == ObservanceKind::Daylight,
        }
    }

    /// Onsets of this observance in ascending order.
    fn onsets(&self, index: usize) -> OnsetIter<'_> {
        let from = self.offset_from;
        let onset = move |local: NaiveDateTime| Onset {
            utc: local - from.as_delta(),
            local,
            index,
        };

        let context = TimeContext::new(&NO_TIMEZONES, FloatingZone::Fixed(from));
        let start = Instant::DateTime(DateTime::floating(self.dtstart));
        let mut sources = Merger::new(|a: &NaiveDateTime, b: &NaiveDateTime| a.cmp(b))
            .with(
                Box::new(std::iter::once(self.dtstart)) as Box<dyn Iterator<Item = NaiveDateTime> + '_>,
                (),
            )
            .with(Box::new(self.rdates.iter().copied()), ());
        for rule in &self.rrules {
            match expand(rule, &start, context, ExpansionOptions::default()) {
                Ok(iter) => sources.push(Box::new(iter.map(|instant| instant.local())), ()),
                Err(error) => {
                    tracing::warn!(%error, rule = %rule, "observance rule not expandable");
                }
            }
        }

        let mut last = None;
        Box::new(sources.map(|(local, ())| local).filter_map(move |local| {
            if last == Some(local) {
                return None;
            }
            last = Some(local);
            Some(onset(local))
        }))
    }
}

impl Timezone {
    /// Reads a VTIMEZONE component.
    ///
    /// ## Errors
    /// Returns an error if the component is not a VTIMEZONE, has no TZID or
    /// observances, or an observance lacks a required property.
    pub fn from_component(component: &Component) -> Result<Self, VTimezoneError> {
        if component.kind != ComponentKind::Timezone {
            return Err(VTimezoneError::NotTimezone(component.name.clone()));
        }
        let tzid = component
            .get_property(names::TZID)
            .and_then(|p| p.as_text())
            .ok_or(VTimezoneError::MissingTzid)?
            .to_string();

        let observances = component
            .children
            .iter()
            .filter(|c| matches!(c.kind, ComponentKind::Standard | ComponentKind::Daylight))
            .map(Observance::from_component)
            .collect::<Result<Vec<_>, _>>()?;
        if observances.is_empty() {
            return Err(VTimezoneError::NoObservances(tzid));
        }

        Ok(Self {
            tzid,
            observances,
            last_modified: component
                .value("LAST-MODIFIED")
                .and_then(Value::as_datetime)
                .cloned(),
            tzurl: component
                .get_property("TZURL")
                .and_then(|p| p.as_text())
                .map(str::to_string),
        })
    }

    #[must_use]
    pub fn tzid(&self) -> &str {
        &self.tzid
    }

    /// All onsets of every observance, merged by UTC.
    fn onsets(&self) -> impl Iterator<Item = Onset> + '_ {
        let mut merger = Merger::new(|a: &Onset, b: &Onset| a.utc.cmp(&b.utc));
        for (index, observance) in self.observances.iter().enumerate() {
            merger.push(observance.onsets(index), ());
        }
        merger.map(|(onset, ())| onset)
    }

    /// What applies before the first onset: the earliest observance's
    /// TZOFFSETFROM.
    fn before_first(&self) -> OffsetInfo {
        let offset = self
            .observances
            .iter()
            .min_by_key(|o| o.dtstart)
            .map_or(UtcOffset::UTC, |o| o.offset_from);
        OffsetInfo {
            offset,
            name: None,
            is_dst: false,
        }
    }

    fn observance(&self, onset: &Onset) -> Option<&Observance> {
        self.observances.get(onset.index)
    }

    /// Offset in effect at a UTC value.
    #[must_use]
    pub fn offset_at_utc(&self, utc: NaiveDateTime) -> OffsetInfo {
        self.onsets()
            .take_while(|onset| onset.utc <= utc)
            .last()
            .and_then(|onset| self.observance(&onset))
            .map_or_else(|| self.before_first(), Observance::info)
    }

    /// Offset used to read a wall-clock value.
    ///
    /// A repeated time takes the earlier offset. A skipped time takes the
    /// offset in effect before the gap.
    #[must_use]
    pub fn offset_at_local(&self, local: NaiveDateTime) -> UtcOffset {
        let Some(onset) = self
            .onsets()
            .take_while(|onset| onset.local <= local)
            .last()
        else {
            return self.before_first().offset;
        };
        let Some(observance) = self.observance(&onset) else {
            return self.before_first().offset;
        };
        let gap = observance.offset_to.as_delta() - observance.offset_from.as_delta();
        if gap > TimeDelta::zero() && local < onset.local + gap {
            observance.offset_from
        } else {
            observance.offset_to
        }
    }

    /// Converts a wall-clock value in this zone to UTC.
    #[must_use]
    pub fn local_to_utc(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        local.checked_sub_signed(self.offset_at_local(local).as_delta())
    }

    /// Converts a UTC value to wall-clock time in this zone.
    #[must_use]
    pub fn utc_to_local(&self, utc: NaiveDateTime) -> Option<NaiveDateTime> {
        utc.checked_add_signed(self.offset_at_utc(utc).offset.as_delta())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::{Frequency, Property, RulePart, Weekday, WeekdayNum};
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn observance(
        kind: ComponentKind,
        from: i32,
        to: i32,
        start: NaiveDateTime,
        rule: Option<Recur>,
        name: &str,
    ) -> Component {
        let mut c = Component::new(kind)
            .with_property(Property::new(
                names::DTSTART,
                Value::DateTime(DateTime::floating(start)),
            ))
            .with_property(Property::new(
                names::TZOFFSETFROM,
                Value::UtcOffset(UtcOffset::from_seconds(from * 3600)),
            ))
            .with_property(Property::new(
                names::TZOFFSETTO,
                Value::UtcOffset(UtcOffset::from_seconds(to * 3600)),
            ))
            .with_property(Property::text(names::TZNAME, name));
        if let Some(rule) = rule {
            c.add_property(Property::new(names::RRULE, Value::Recur(Box::new(rule))));
        }
        c
    }

    fn us_eastern() -> Component {
        let standard = observance(
            ComponentKind::Standard,
            -4,
            -5,
            at(1970, 11, 1, 2, 0),
            Some(
                Recur::new(Frequency::Yearly)
                    .with(RulePart::ByMonth(vec![11]))
                    .with(RulePart::ByDay(vec![WeekdayNum::nth(1, Weekday::Sunday)])),
            ),
            "EST",
        );
        let daylight = observance(
            ComponentKind::Daylight,
            -5,
            -4,
            at(1970, 3, 8, 2, 0),
            Some(
                Recur::new(Frequency::Yearly)
                    .with(RulePart::ByMonth(vec![3]))
                    .with(RulePart::ByDay(vec![WeekdayNum::nth(2, Weekday::Sunday)])),
            ),
            "EDT",
        );
        let mut tz = Component::new(ComponentKind::Timezone)
            .with_property(Property::text(names::TZID, "US/Eastern"));
        tz.add_child(standard);
        tz.add_child(daylight);
        tz
    }

    #[test]
    fn us_eastern_offsets() {
        let tz = Timezone::from_component(&us_eastern()).unwrap();
        assert_eq!(tz.tzid(), "US/Eastern");
        assert_eq!(tz.observances.len(), 2);

        let jan = tz.offset_at_utc(at(2026, 1, 15, 12, 0));
        assert_eq!(jan.offset, UtcOffset::from_seconds(-5 * 3600));
        assert_eq!(jan.name.as_deref(), Some("EST"));
        assert!(!jan.is_dst);

        let jul = tz.offset_at_utc(at(2026, 7, 15, 12, 0));
        assert_eq!(jul.offset, UtcOffset::from_seconds(-4 * 3600));
        assert!(jul.is_dst);
    }

    #[test]
    fn transitions_follow_the_rules() {
        let tz = Timezone::from_component(&us_eastern()).unwrap();
        // 2026-03-08 is the second Sunday of March; 02:00 EST is 07:00Z.
        assert_eq!(
            tz.offset_at_utc(at(2026, 3, 8, 6, 59)).offset,
            UtcOffset::from_seconds(-5 * 3600)
        );
        assert_eq!(
            tz.offset_at_utc(at(2026, 3, 8, 7, 0)).offset,
            UtcOffset::from_seconds(-4 * 3600)
        );
        // 2026-11-01 02:00 EDT is 06:00Z.
        assert_eq!(
            tz.offset_at_utc(at(2026, 11, 1, 6, 0)).offset,
            UtcOffset::from_seconds(-5 * 3600)
        );
    }

    #[test]
    fn local_round_trip() {
        let tz = Timezone::from_component(&us_eastern()).unwrap();
        let local = at(2026, 7, 15, 10, 0);
        let utc = tz.local_to_utc(local).unwrap();
        assert_eq!(utc, at(2026, 7, 15, 14, 0));
        assert_eq!(tz.utc_to_local(utc), Some(local));
    }

    #[test]
    fn gap_and_overlap() {
        let tz = Timezone::from_component(&us_eastern()).unwrap();
        // Skipped: read with the offset before the gap.
        assert_eq!(tz.local_to_utc(at(2026, 3, 8, 2, 30)), Some(at(2026, 3, 8, 7, 30)));
        // Repeated: the first occurrence.
        assert_eq!(tz.local_to_utc(at(2026, 11, 1, 1, 30)), Some(at(2026, 11, 1, 5, 30)));
    }

    #[test]
    fn before_first_onset_uses_offset_from() {
        let tz = Timezone::from_component(&us_eastern()).unwrap();
        let info = tz.offset_at_utc(at(1960, 1, 1, 0, 0));
        assert_eq!(info.offset, UtcOffset::from_seconds(-5 * 3600));
        assert_eq!(info.name, None);
    }

    #[test]
    fn fixed_offset_without_rules() {
        let standard = Component::new(ComponentKind::Standard)
            .with_property(Property::new(
                names::DTSTART,
                Value::DateTime(DateTime::floating(at(1970, 1, 1, 0, 0))),
            ))
            .with_property(Property::new(
                names::TZOFFSETFROM,
                Value::UtcOffset(UtcOffset::from_seconds(19_800)),
            ))
            .with_property(Property::new(
                names::TZOFFSETTO,
                Value::UtcOffset(UtcOffset::from_seconds(19_800)),
            ));
        let mut component = Component::new(ComponentKind::Timezone)
            .with_property(Property::text(names::TZID, "Asia/Kolkata"));
        component.add_child(standard);

        let tz = Timezone::from_component(&component).unwrap();
        // 12:00 IST is 06:30 UTC.
        assert_eq!(tz.local_to_utc(at(2026, 1, 15, 12, 0)), Some(at(2026, 1, 15, 6, 30)));
    }

    #[test]
    fn rdate_onsets() {
        let mut daylight = observance(
            ComponentKind::Daylight,
            1,
            2,
            at(2000, 3, 26, 2, 0),
            None,
            "CEST",
        );
        daylight.add_property(Property::new(
            names::RDATE,
            Value::List(vec![Value::DateTime(DateTime::floating(at(2001, 3, 25, 2, 0)))]),
        ));
        let mut standard = observance(
            ComponentKind::Standard,
            2,
            1,
            at(2000, 10, 29, 3, 0),
            None,
            "CET",
        );
        standard.add_property(Property::new(
            names::RDATE,
            Value::DateTime(DateTime::floating(at(2001, 10, 28, 3, 0))),
        ));
        let mut component = Component::new(ComponentKind::Timezone)
            .with_property(Property::text(names::TZID, "Custom/Berlin"));
        component.add_child(daylight);
        component.add_child(standard);

        let tz = Timezone::from_component(&component).unwrap();
        let summer = tz.offset_at_utc(at(2001, 6, 1, 0, 0));
        assert_eq!(summer.offset, UtcOffset::from_seconds(7200));
        assert_eq!(summer.name.as_deref(), Some("CEST"));
        let winter = tz.offset_at_utc(at(2001, 12, 1, 0, 0));
        assert_eq!(winter.offset, UtcOffset::from_seconds(3600));
    }

    #[test]
    fn errors() {
        assert_eq!(
            Timezone::from_component(&Component::new(ComponentKind::Event)),
            Err(VTimezoneError::NotTimezone("VEVENT".to_string()))
        );
        assert_eq!(
            Timezone::from_component(&Component::new(ComponentKind::Timezone)),
            Err(VTimezoneError::MissingTzid)
        );
        let bare = Component::new(ComponentKind::Timezone)
            .with_property(Property::text(names::TZID, "Bare"));
        assert_eq!(
            Timezone::from_component(&bare),
            Err(VTimezoneError::NoObservances("Bare".to_string()))
        );

        let mut missing = Component::new(ComponentKind::Timezone)
            .with_property(Property::text(names::TZID, "Broken"));
        missing.add_child(Component::new(ComponentKind::Standard));
        assert_eq!(
            Timezone::from_component(&missing),
            Err(VTimezoneError::MissingProperty("TZOFFSETFROM", "STANDARD"))
        );
    }
}
