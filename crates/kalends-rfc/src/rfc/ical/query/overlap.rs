//! Overlap predicates per component kind (RFC 4791 §9.9).

use chrono::NaiveDateTime;

use super::TimeRange;
use crate::rfc::ical::core::{Component, ComponentKind, Duration, TriggerRelated, Value, names};
use crate::rfc::ical::expand::{Instant, TimeContext};

/// The timing of one component instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Option<Instant>,
    pub end: Option<SpanEnd>,
}

/// How a span ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanEnd {
    /// DTEND or DUE.
    At(Instant),
    /// DURATION from the start.
    After(Duration),
}

impl Span {
    /// Reads DTSTART and DTEND, DUE or DURATION.
    #[must_use]
    pub fn of(component: &Component) -> Self {
        let start = component.value(names::DTSTART).and_then(Instant::from_value);
        let end = component
            .value(names::DURATION)
            .and_then(Value::as_duration)
            .map(|d| SpanEnd::After(*d))
            .or_else(|| {
                component
                    .value(names::DTEND)
                    .or_else(|| component.value(names::DUE))
                    .and_then(Instant::from_value)
                    .map(SpanEnd::At)
            });
        Self { start, end }
    }

    /// Returns the end as an instant, resolving a duration against the start.
    #[must_use]
    pub fn end_instant(&self, context: TimeContext<'_>) -> Option<Instant> {
        match (&self.start, &self.end) {
            (_, Some(SpanEnd::At(end))) => Some(end.clone()),
            (Some(start), Some(SpanEnd::After(duration))) => {
                context.add_duration(start, duration)
            }
            _ => None,
        }
    }
}

/// Every trigger instant of a VALARM, repetitions included.
///
/// Relative triggers are resolved against the container's span.
#[must_use]
pub fn alarm_triggers(alarm: &Component, container: &Span, context: TimeContext<'_>) -> Vec<Instant> {
    let repeat = alarm
        .value(names::REPEAT)
        .and_then(Value::as_integer)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0);
    let interval = alarm.value(names::DURATION).and_then(Value::as_duration);

    let mut triggers = Vec::new();
    for property in alarm.get_properties(names::TRIGGER) {
        let first = match &property.value {
            Value::Duration(offset) => {
                let anchor = match property.related() {
                    TriggerRelated::Start => container.start.clone(),
                    TriggerRelated::End => container.end_instant(context),
                };
                anchor.and_then(|a| context.add_duration(&a, offset))
            }
            Value::DateTime(dt) => Some(Instant::DateTime(dt.clone())),
            _ => None,
        };
        let Some(first) = first else {
            tracing::debug!(trigger = ?property.value, "alarm trigger has no anchor");
            continue;
        };
        if let Some(interval) = interval {
            triggers.extend(
                (1..=repeat).filter_map(|k| context.add_duration(&first, &interval.times(k))),
            );
        }
        triggers.push(first);
    }
    triggers.sort_by(|a, b| context.compare(a, b));
    triggers
}

/// Tests component instances against one window.
#[derive(Debug, Clone, Copy)]
pub struct Overlap<'a> {
    range: TimeRange,
    context: TimeContext<'a>,
}

impl<'a> Overlap<'a> {
    #[must_use]
    pub const fn new(range: TimeRange, context: TimeContext<'a>) -> Self {
        Self { range, context }
    }

    /// Dispatches on the component kind.
    #[must_use]
    pub fn component(&self, component: &Component, span: &Span) -> bool {
        match component.kind {
            ComponentKind::Event => self.event(span),
            ComponentKind::Todo => self.todo(component, span),
            ComponentKind::Journal => self.journal(span),
            ComponentKind::FreeBusy => self.freebusy(component, span),
            _ => false,
        }
    }

    fn utc(&self, instant: &Instant) -> NaiveDateTime {
        self.context
            .to_utc(instant)
            .unwrap_or_else(|| instant.local())
    }

    fn end_of(&self, start: &Instant, duration: &Duration) -> NaiveDateTime {
        self.context
            .add_duration(start, duration)
            .map_or_else(|| self.utc(start), |end| self.utc(&end))
    }

    /// `start < t`
    fn starts_before(&self, t: NaiveDateTime) -> bool {
        self.range.start().is_none_or(|s| s < t)
    }

    /// `start <= t`
    fn starts_by(&self, t: NaiveDateTime) -> bool {
        self.range.start().is_none_or(|s| s <= t)
    }

    /// `end > t`
    fn ends_after(&self, t: NaiveDateTime) -> bool {
        self.range.end().is_none_or(|e| e > t)
    }

    /// `end >= t`
    fn ends_by(&self, t: NaiveDateTime) -> bool {
        self.range.end().is_none_or(|e| e >= t)
    }

    /// A point, or a whole day for a DATE.
    fn point(&self, start: &Instant) -> bool {
        let s = self.utc(start);
        if start.is_date() {
            self.starts_before(self.end_of(start, &Duration::days(1))) && self.ends_after(s)
        } else {
            self.starts_by(s) && self.ends_after(s)
        }
    }

    #[must_use]
    pub fn event(&self, span: &Span) -> bool {
        let Some(start) = &span.start else {
            return false;
        };
        let s = self.utc(start);
        match &span.end {
            Some(SpanEnd::At(end)) => self.starts_before(self.utc(end)) && self.ends_after(s),
            Some(SpanEnd::After(duration)) if !duration.is_non_positive() => {
                self.starts_before(self.end_of(start, duration)) && self.ends_after(s)
            }
            Some(SpanEnd::After(_)) => self.starts_by(s) && self.ends_after(s),
            None => self.point(start),
        }
    }

    #[must_use]
    pub fn todo(&self, component: &Component, span: &Span) -> bool {
        match (&span.start, &span.end) {
            (Some(start), Some(SpanEnd::After(duration))) => {
                let s = self.utc(start);
                let e = self.end_of(start, duration);
                self.starts_by(e) && (self.ends_after(s) || self.ends_by(e))
            }
            (Some(start), Some(SpanEnd::At(due))) => {
                let s = self.utc(start);
                let d = self.utc(due);
                (self.starts_before(d) || self.starts_by(s)) && (self.ends_after(s) || self.ends_by(d))
            }
            (Some(start), None) => {
                let s = self.utc(start);
                self.starts_by(s) && self.ends_after(s)
            }
            (None, Some(SpanEnd::At(due))) => {
                let d = self.utc(due);
                self.starts_before(d) && self.ends_by(d)
            }
            (None, _) => {
                let read = |name: &str| {
                    component
                        .value(name)
                        .and_then(Instant::from_value)
                        .map(|i| self.utc(&i))
                };
                match (read(names::COMPLETED), read(names::CREATED)) {
                    (Some(done), Some(created)) => {
                        (self.starts_by(created) || self.starts_by(done))
                            && (self.ends_by(created) || self.ends_by(done))
                    }
                    (Some(done), None) => self.starts_by(done) && self.ends_by(done),
                    (None, Some(created)) => self.ends_after(created),
                    (None, None) => true,
                }
            }
        }
    }

    #[must_use]
    pub fn journal(&self, span: &Span) -> bool {
        span.start.as_ref().is_some_and(|start| self.point(start))
    }

    #[must_use]
    pub fn freebusy(&self, component: &Component, span: &Span) -> bool {
        if let (Some(start), Some(SpanEnd::At(end))) = (&span.start, &span.end) {
            return self.starts_by(self.utc(end)) && self.ends_after(self.utc(start));
        }
        component
            .get_properties(names::FREEBUSY)
            .flat_map(|p| p.value.items())
            .any(|value| self.period(value))
    }

    /// A FREEBUSY period overlaps the window.
    #[must_use]
    pub fn period(&self, value: &Value) -> bool {
        let Value::Period(period) = value else {
            return false;
        };
        let start = Instant::DateTime(period.start().clone());
        let Some(end) = period.end().map(Instant::DateTime) else {
            return false;
        };
        self.starts_before(self.utc(&end)) && self.ends_after(self.utc(&start))
    }

    /// Any trigger of the alarm lies in the window.
    #[must_use]
    pub fn alarm(&self, alarm: &Component, container: &Span) -> bool {
        alarm_triggers(alarm, container, self.context)
            .iter()
            .map(|t| self.utc(t))
            .any(|t| self.starts_by(t) && self.ends_after(t))
    }
}
