//! Time-range queries over parsed calendars.
//!
//! [`scan_uid`] and [`scan`] walk the occurrences of recurrence sets,
//! [`apply_override`] builds one concrete occurrence, and [`time_range`]
//! answers CalDAV-style time-range, limit-recurrence-set and expand requests.
//! Query windows are UTC.

mod overlap;
mod range;
mod scan;

pub use overlap::{Overlap, Span, SpanEnd, alarm_triggers};
pub use range::{alarm_range, limit_freebusy, time_range, to_utc};
pub use scan::{
    Occurrence, OccurrenceIter, apply_override, base_instants, check_overrides, scan, scan_uid,
};

use chrono::NaiveDateTime;

use crate::rfc::ical::core::ComponentKind;
use crate::rfc::ical::expand::{ExpansionError, ExpansionOptions, FloatingZone};

/// Errors raised before a query runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("time range needs a start or an end")]
    NoBounds,

    #[error("time range end {end} is not after its start {start}")]
    Inverted {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("{mode} needs both a start and an end")]
    Unbounded { mode: &'static str },

    #[error(transparent)]
    Expansion(#[from] ExpansionError),
}

/// A UTC query window, `[start, end)`. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
}

impl TimeRange {
    /// ## Errors
    /// Returns an error if both bounds are open or `end` is not after `start`.
    pub fn new(
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Self, QueryError> {
        match (start, end) {
            (None, None) => Err(QueryError::NoBounds),
            (Some(start), Some(end)) if end <= start => Err(QueryError::Inverted { start, end }),
            _ => Ok(Self { start, end }),
        }
    }

    /// ## Errors
    /// Returns an error if `end` is not after `start`.
    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, QueryError> {
        Self::new(Some(start), Some(end))
    }

    #[must_use]
    pub const fn starting(start: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    #[must_use]
    pub const fn ending(end: NaiveDateTime) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    #[must_use]
    pub const fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    const fn is_bounded(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}

/// How recurring components appear in a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecurrenceMode {
    /// Matching components are returned as stored.
    #[default]
    AsIs,
    /// The base and every override with an instance overlapping the window.
    Limit(TimeRange),
    /// One standalone component per instance overlapping the window.
    Expand(TimeRange),
}

impl RecurrenceMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AsIs => "as-is",
            Self::Limit(_) => "limit-recurrence-set",
            Self::Expand(_) => "expand",
        }
    }

    const fn window(&self) -> Option<&TimeRange> {
        match self {
            Self::AsIs => None,
            Self::Limit(window) | Self::Expand(window) => Some(window),
        }
    }
}

/// A time-range query.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Query {
    /// Restricts the scan to one component kind.
    pub kind: Option<ComponentKind>,
    /// Window the components themselves must overlap.
    pub range: Option<TimeRange>,
    /// Window at least one VALARM trigger must fall in.
    pub alarm_range: Option<TimeRange>,
    pub mode: RecurrenceMode,
    /// Zone floating values are read in.
    pub floating: FloatingZone,
    pub expansion: ExpansionOptions,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn kind(mut self, kind: ComponentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub const fn range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    #[must_use]
    pub const fn alarms(mut self, range: TimeRange) -> Self {
        self.alarm_range = Some(range);
        self
    }

    #[must_use]
    pub const fn mode(mut self, mode: RecurrenceMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn floating(mut self, floating: FloatingZone) -> Self {
        self.floating = floating;
        self
    }

    #[must_use]
    pub const fn expansion(mut self, options: ExpansionOptions) -> Self {
        self.expansion = options;
        self
    }

    /// Checks the query before anything is scanned.
    ///
    /// ## Errors
    /// Returns [`QueryError::Unbounded`] if a limit or expand window lacks a
    /// bound.
    pub fn validate(&self) -> Result<(), QueryError> {
        match self.mode.window() {
            Some(window) if !window.is_bounded() => Err(QueryError::Unbounded {
                mode: self.mode.as_str(),
            }),
            _ => Ok(()),
        }
    }

    /// True when no window has an upper bound.
    fn is_open_ended(&self) -> bool {
        self.mode.window().is_none()
            && self.range.is_none_or(|r| r.end.is_none())
            && self.alarm_range.is_none_or(|r| r.end.is_none())
    }

    /// Latest upper bound among the windows.
    fn upper_bound(&self) -> Option<NaiveDateTime> {
        [self.range, self.alarm_range, self.mode.window().copied()]
            .into_iter()
            .flatten()
            .filter_map(|r| r.end)
            .max()
    }

    const fn is_trivial(&self) -> bool {
        self.range.is_none() && self.alarm_range.is_none() && self.mode.window().is_none()
    }
}
