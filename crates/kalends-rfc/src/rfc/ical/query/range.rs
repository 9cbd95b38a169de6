//! CalDAV time-range filtering (RFC 4791 §9.6.5, §9.9).

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};

use super::overlap::{Overlap, Span};
use super::scan::{Occurrence, scan_uid, scan_uids};
use super::{Query, QueryError, RecurrenceMode, TimeRange};
use crate::rfc::ical::core::{
    Calendar, Component, ComponentKind, DateTime, DateTimeForm, Period, RecurrenceRange, Value,
    names,
};
use crate::rfc::ical::expand::{FloatingZone, Instant, TimeContext, TimezoneTable};

/// Components picked by a query, each at most once.
#[derive(Debug, Default)]
struct Found<'a> {
    picked: Vec<Picked<'a>>,
}

#[derive(Debug)]
enum Picked<'a> {
    /// A stored component with the children an alarm window selected.
    Stored {
        source: &'a Component,
        children: Vec<bool>,
    },
    /// A synthesized instance.
    Built(Component),
}

impl<'a> Found<'a> {
    fn keep(&mut self, source: &'a Component, children: Vec<bool>) {
        for picked in &mut self.picked {
            if let Picked::Stored {
                source: seen,
                children: mask,
            } = picked
                && std::ptr::eq(*seen, source)
            {
                for (kept, hit) in mask.iter_mut().zip(children) {
                    *kept |= hit;
                }
                return;
            }
        }
        self.picked.push(Picked::Stored { source, children });
    }

    fn add(&mut self, component: Component) {
        let duplicate = self
            .picked
            .iter()
            .any(|p| matches!(p, Picked::Built(built) if *built == component));
        if !duplicate {
            self.picked.push(Picked::Built(component));
        }
    }

    fn has(&self, component: &Component) -> bool {
        self.picked
            .iter()
            .any(|p| matches!(p, Picked::Stored { source, .. } if std::ptr::eq(*source, component)))
    }

    fn len(&self) -> usize {
        self.picked.len()
    }

    /// Clones the picked components, dropping unselected children.
    fn into_components(self) -> Vec<Component> {
        self.picked
            .into_iter()
            .map(|picked| match picked {
                Picked::Built(component) => component,
                Picked::Stored { source, children } => Component {
                    kind: source.kind,
                    name: source.name.clone(),
                    properties: source.properties.clone(),
                    children: source
                        .children
                        .iter()
                        .zip(children)
                        .filter(|(_, keep)| *keep)
                        .map(|(child, _)| child.clone())
                        .collect(),
                },
            })
            .collect()
    }
}

/// Which children of `source` stay in the result: every non-alarm child, and
/// the VALARMs with a trigger in the alarm window when there is one.
fn selected_children(
    source: &Component,
    instance: &Component,
    query: &Query,
    context: TimeContext<'_>,
) -> Vec<bool> {
    let span = Span::of(instance);
    let overlap = query.alarm_range.map(|alarms| Overlap::new(alarms, context));
    source
        .children
        .iter()
        .map(|child| {
            child.kind != ComponentKind::Alarm
                || overlap.as_ref().is_none_or(|o| o.alarm(child, &span))
        })
        .collect()
}

/// True when a component instance passes the query's range and alarm tests.
fn passes(component: &Component, query: &Query, context: TimeContext<'_>) -> bool {
    let span = Span::of(component);
    let in_range = |range| Overlap::new(range, context).component(component, &span);
    if let Some(alarms) = query.alarm_range {
        let overlap = Overlap::new(alarms, context);
        let hit = component
            .children_of_kind(ComponentKind::Alarm)
            .any(|alarm| overlap.alarm(alarm, &span));
        hit && query.range.is_none_or(in_range)
    } else {
        query.range.is_none_or(in_range)
    }
}

/// Drops the VALARMs that have no trigger in the alarm window.
fn matching_alarms(component: Component, query: &Query, context: TimeContext<'_>) -> Component {
    let selected = selected_children(&component, &component, query, context);
    let children = component
        .children
        .iter()
        .zip(selected)
        .filter(|(_, keep)| *keep)
        .map(|(child, _)| child.clone())
        .collect();
    Component {
        children,
        ..component
    }
}

fn overlaps(window: TimeRange, component: &Component, context: TimeContext<'_>) -> bool {
    Overlap::new(window, context).component(component, &Span::of(component))
}

/// How long before its start an instance of `kind` can trigger an alarm.
fn alarm_lead(calendar: &Calendar, kind: ComponentKind) -> TimeDelta {
    let seconds = calendar
        .components_of_kind(kind)
        .flat_map(|c| c.children_of_kind(ComponentKind::Alarm))
        .flat_map(|alarm| alarm.get_properties(names::TRIGGER))
        .filter_map(|p| p.value.as_duration())
        .map(|d| -d.as_seconds())
        .max()
        .unwrap_or(0)
        .max(0);
    TimeDelta::try_seconds(seconds).unwrap_or(TimeDelta::MAX)
}

/// True if the base has an RRULE with neither COUNT nor UNTIL.
fn is_unbounded(base: &Component) -> bool {
    base.get_properties(names::RRULE)
        .filter_map(|p| p.value.as_recur())
        .any(|rule| !rule.is_bounded())
}

/// Returns the components of `calendar` that match `query`.
///
/// With [`RecurrenceMode::AsIs`] and [`RecurrenceMode::Limit`] a matching
/// instance pulls in its base and its override unchanged. With
/// [`RecurrenceMode::Expand`] each matching instance becomes its own
/// component. The result keeps the calendar properties and every VTIMEZONE.
///
/// When no window has an end, recurrence sets with an unbounded RRULE are
/// returned whole without scanning.
///
/// ## Errors
/// Returns an error if the query is malformed or a rule cannot be expanded.
#[tracing::instrument(skip(calendar, query), fields(mode = query.mode.as_str()))]
pub fn time_range(calendar: &Calendar, query: &Query) -> Result<Calendar, QueryError> {
    query.validate()?;
    if query.is_trivial() {
        return Ok(calendar.clone());
    }

    let context = TimeContext::new(calendar.timezones(), query.floating);
    let upper = query.upper_bound();
    let mut found = Found::default();

    for kind in ComponentKind::SCHEDULABLE
        .into_iter()
        .filter(|k| query.kind.is_none_or(|q| q == *k))
    {
        let mut uids = calendar.uids(kind);
        let mut anonymous: Vec<&Component> = calendar
            .components_of_kind(kind)
            .filter(|c| c.uid().is_none())
            .collect();
        if query.is_open_ended() {
            for base in calendar
                .components_of_kind(kind)
                .filter(|c| !c.is_override() && is_unbounded(c))
            {
                found.keep(base, vec![true; base.children.len()]);
                match base.uid() {
                    Some(uid) => {
                        uids.retain(|u| *u != uid);
                        keep_open_overrides(calendar, kind, uid, query, context, &mut found)?;
                    }
                    None => anonymous.retain(|c| !std::ptr::eq(*c, base)),
                }
            }
        }

        let bound = match (upper, query.alarm_range) {
            (Some(upper), Some(_)) => Some(
                upper
                    .checked_add_signed(alarm_lead(calendar, kind))
                    .unwrap_or(NaiveDateTime::MAX),
            ),
            (upper, _) => upper,
        };
        for occurrence in scan_uids(
            calendar,
            kind,
            &uids,
            &anonymous,
            context,
            query.expansion,
        )? {
            if let (Some(instant), Some(bound)) = (&occurrence.instant, bound)
                && context.to_utc(instant).is_some_and(|t| t > bound)
            {
                break;
            }
            let effective = occurrence.effective(context);
            match query.mode {
                RecurrenceMode::AsIs => {}
                RecurrenceMode::Limit(window) => {
                    let plain = Occurrence {
                        overriding: None,
                        ..occurrence.clone()
                    }
                    .effective(context);
                    if !overlaps(window, &effective, context) && !overlaps(window, &plain, context)
                    {
                        continue;
                    }
                }
                RecurrenceMode::Expand(window) => {
                    if !overlaps(window, &effective, context) {
                        continue;
                    }
                }
            }
            if !passes(&effective, query, context) {
                continue;
            }
            if matches!(query.mode, RecurrenceMode::Expand(_)) {
                found.add(matching_alarms(effective, query, context));
            } else {
                let base = occurrence.base;
                found.keep(base, selected_children(base, &effective, query, context));
                if let Some(overriding) = occurrence.overriding {
                    found.keep(
                        overriding,
                        selected_children(overriding, &effective, query, context),
                    );
                }
            }
        }
    }

    tracing::debug!(found = found.len(), "time range done");
    let mut children: Vec<Component> = calendar
        .components_of_kind(ComponentKind::Timezone)
        .cloned()
        .collect();
    children.extend(found.into_components());
    let root = Component {
        kind: ComponentKind::Calendar,
        name: calendar.root.name.clone(),
        properties: calendar.root.properties.clone(),
        children,
    };
    Ok(Calendar::from_parts(root, calendar.shared_timezones()))
}

/// Picks the overrides of an unbounded set. THISANDFUTURE overrides are
/// always kept; the others when their instance passes the query.
fn keep_open_overrides<'a>(
    calendar: &'a Calendar,
    kind: ComponentKind,
    uid: &str,
    query: &Query,
    context: TimeContext<'a>,
    found: &mut Found<'a>,
) -> Result<(), QueryError> {
    let mut limited: Vec<(&'a Component, Instant)> = Vec::new();
    for upon in calendar
        .components_of_kind(kind)
        .filter(|c| c.uid() == Some(uid))
    {
        let Some(rid) = upon.get_property(names::RECURRENCE_ID) else {
            continue;
        };
        if rid.range() == Some(RecurrenceRange::ThisAndFuture) {
            found.keep(upon, vec![true; upon.children.len()]);
        } else if let Some(instant) = Instant::from_value(&rid.value) {
            limited.push((upon, instant));
        }
    }
    let Some(limit) = limited
        .iter()
        .map(|(_, rid)| rid)
        .max_by(|a, b| context.compare(a, b))
        .cloned()
    else {
        return Ok(());
    };

    for occurrence in scan_uid(calendar, kind, uid, context, query.expansion)? {
        let Some(instant) = &occurrence.instant else {
            continue;
        };
        if context.compare(instant, &limit) == Ordering::Greater || limited.is_empty() {
            break;
        }
        let Some(upon) = occurrence.overriding else {
            continue;
        };
        if found.has(upon) || !limited.iter().any(|(c, _)| std::ptr::eq(*c, upon)) {
            continue;
        }
        let effective = occurrence.effective(context);
        if passes(&effective, query, context) {
            found.keep(upon, selected_children(upon, &effective, query, context));
            limited.retain(|(c, _)| !std::ptr::eq(*c, upon));
        }
    }
    Ok(())
}

/// Returns the components with at least one VALARM triggering in `range`.
///
/// ## Errors
/// Returns an error if a rule cannot be expanded.
pub fn alarm_range(
    calendar: &Calendar,
    kind: Option<ComponentKind>,
    range: TimeRange,
    floating: FloatingZone,
) -> Result<Calendar, QueryError> {
    let mut query = Query::new().alarms(range).floating(floating);
    query.kind = kind;
    time_range(calendar, &query)
}

/// Keeps only the FREEBUSY properties with a period overlapping `range`.
#[must_use]
pub fn limit_freebusy(calendar: &Calendar, range: TimeRange, floating: FloatingZone) -> Calendar {
    let context = TimeContext::new(calendar.timezones(), floating);
    let overlap = Overlap::new(range, context);
    let mut limited = calendar.clone();
    for component in limited
        .root
        .children
        .iter_mut()
        .filter(|c| c.kind == ComponentKind::FreeBusy)
    {
        component.properties.retain(|p| {
            p.name != names::FREEBUSY || p.value.items().any(|period| overlap.period(period))
        });
    }
    limited
}

/// Rewrites every zoned DATE-TIME as UTC and drops the VTIMEZONEs.
///
/// Floating values and DATEs are left alone.
#[must_use]
pub fn to_utc(calendar: &Calendar) -> Calendar {
    let context = TimeContext::new(calendar.timezones(), FloatingZone::default());
    let mut root = calendar.root.clone();
    root.children.retain(|c| c.kind != ComponentKind::Timezone);
    convert_component(&mut root, context);
    Calendar::from_parts(root, Arc::new(TimezoneTable::new()))
}

fn convert_component(component: &mut Component, context: TimeContext<'_>) {
    for prop in &mut component.properties {
        if convert_value(&mut prop.value, context) {
            prop.remove_param("TZID");
        }
    }
    for child in &mut component.children {
        convert_component(child, context);
    }
}

/// Returns true if anything was converted.
fn convert_value(value: &mut Value, context: TimeContext<'_>) -> bool {
    match value {
        Value::DateTime(dt) => convert_datetime(dt, context),
        Value::Period(Period::Explicit { start, end }) => {
            let a = convert_datetime(start, context);
            let b = convert_datetime(end, context);
            a || b
        }
        Value::Period(Period::Duration { start, .. }) => convert_datetime(start, context),
        Value::List(items) => items
            .iter_mut()
            .fold(false, |any, item| convert_value(item, context) || any),
        _ => false,
    }
}

fn convert_datetime(dt: &mut DateTime, context: TimeContext<'_>) -> bool {
    if !matches!(dt.form, DateTimeForm::Zoned { .. }) {
        return false;
    }
    match context.local_to_utc(dt.local, &dt.form) {
        Some(utc) => {
            *dt = DateTime {
                leap_second: dt.leap_second,
                ..DateTime::utc(utc)
            };
            true
        }
        None => {
            tracing::warn!(value = %dt, "cannot convert to UTC");
            false
        }
    }
}

#[cfg(test)]
#[path = "range_tests.rs"]
mod tests;
