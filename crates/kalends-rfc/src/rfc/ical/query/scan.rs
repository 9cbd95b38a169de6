//! Occurrence scanning of recurrence sets.
//!
//! A recurrence set is every component sharing a UID: the bases (no
//! RECURRENCE-ID) and the overrides. The base's instants are DTSTART, the
//! RDATEs and the RRULE expansions, minus the EXDATEs and EXRULE expansions.
//! Each instant is paired with the override that applies to it.

use std::cmp::Ordering;

use super::QueryError;
use crate::rfc::ical::core::{
    Calendar, Component, ComponentKind, DateTimeForm, Parameter, Property, RecurrenceRange, Value,
    names,
};
use crate::rfc::ical::expand::{
    ExpansionError, ExpansionOptions, FloatingZone, Instant, Merger, TimeContext, expand,
};
use crate::rfc::ical::parse::property_with_value;
use crate::rfc::ical::validate::ValidationError;

/// One instance of a recurrence set.
#[derive(Debug, Clone)]
pub struct Occurrence<'a> {
    /// The instant from the base's set; `None` for a component without
    /// DTSTART.
    pub instant: Option<Instant>,
    /// End given by an RDATE period.
    pub period_end: Option<Instant>,
    pub base: &'a Component,
    pub overriding: Option<&'a Component>,
}

impl Occurrence<'_> {
    /// Builds the component this instance stands for.
    #[must_use]
    pub fn effective(&self, context: TimeContext<'_>) -> Component {
        match &self.instant {
            Some(instant) if self.overriding.is_some() || !self.base.is_override() => {
                apply_override(
                    self.base,
                    instant,
                    self.period_end.as_ref(),
                    self.overriding,
                    context,
                )
            }
            _ => self.base.clone(),
        }
    }
}

/// Lazy occurrence stream.
pub type OccurrenceIter<'a> = Box<dyn Iterator<Item = Occurrence<'a>> + 'a>;

/// Instants of a base with the end of their RDATE period, if any.
pub type InstantIter<'a> = Box<dyn Iterator<Item = (Instant, Option<Instant>)> + 'a>;

/// Streams the instants of one base in ascending order.
///
/// DTSTART always counts as the first instance. Duplicates are dropped.
/// A base without DTSTART yields nothing.
///
/// ## Errors
/// Returns an error if an RRULE or EXRULE cannot be expanded.
pub fn base_instants<'a>(
    base: &Component,
    context: TimeContext<'a>,
    options: ExpansionOptions,
) -> Result<InstantIter<'a>, ExpansionError> {
    let Some(start) = base.value(names::DTSTART).and_then(Instant::from_value) else {
        return Ok(Box::new(std::iter::empty()));
    };

    let mut rdates: Vec<(Instant, Option<Instant>)> = base
        .get_properties(names::RDATE)
        .flat_map(|p| p.value.items())
        .filter_map(|value| match value {
            Value::Period(period) => Some((
                Instant::DateTime(period.start().clone()),
                period.end().map(Instant::DateTime),
            )),
            other => Instant::from_value(other).map(|i| (i, None)),
        })
        .collect();
    rdates.sort_by(|a, b| context.compare(&a.0, &b.0));

    let mut set = Merger::new(
        move |a: &(Instant, Option<Instant>), b: &(Instant, Option<Instant>)| {
            context.compare(&a.0, &b.0)
        },
    )
    .with(boxed(std::iter::once((start.clone(), None))), ())
    .with(boxed(rdates.into_iter()), ());
    for rule in base
        .get_properties(names::RRULE)
        .filter_map(|p| p.value.as_recur())
    {
        let instants = expand(rule, &start, context, options)?;
        set.push(boxed(instants.map(|i| (i, None))), ());
    }

    let mut exdates: Vec<Instant> = base
        .get_properties(names::EXDATE)
        .flat_map(|p| p.value.items())
        .filter_map(Instant::from_value)
        .collect();
    exdates.sort_by(|a, b| context.compare(a, b));

    let mut unset = Merger::new(move |a: &Instant, b: &Instant| context.compare(a, b))
        .with(boxed(exdates.into_iter()), ());
    for rule in base
        .get_properties(names::EXRULE)
        .filter_map(|p| p.value.as_recur())
    {
        unset.push(boxed(expand(rule, &start, context, options)?), ());
    }

    let mut set = set.map(|(item, ())| item);
    let mut unset = unset.map(|(item, ())| item).peekable();
    let mut last: Option<Instant> = None;
    let mut skipped = 0_u32;
    Ok(Box::new(std::iter::from_fn(move || {
        for (instant, end) in set.by_ref() {
            if last
                .as_ref()
                .is_some_and(|prev| context.compare(prev, &instant) != Ordering::Less)
            {
                continue;
            }
            while unset
                .next_if(|x| context.compare(x, &instant) == Ordering::Less)
                .is_some()
            {}
            let excluded = unset
                .peek()
                .is_some_and(|x| context.compare(x, &instant) == Ordering::Equal);
            last = Some(instant.clone());
            if excluded {
                skipped += 1;
                if skipped >= options.max_idle_periods {
                    tracing::debug!(skipped, "every instance excluded, stopping");
                    return None;
                }
                continue;
            }
            skipped = 0;
            return Some((instant, end));
        }
        None
    })))
}

fn boxed<'a, T, I>(iter: I) -> Box<dyn Iterator<Item = T> + 'a>
where
    I: Iterator<Item = T> + 'a,
{
    Box::new(iter)
}

#[derive(Debug, Clone)]
struct Override<'a> {
    rid: Instant,
    range: Option<RecurrenceRange>,
    component: &'a Component,
}

impl<'a> Override<'a> {
    fn read(component: &'a Component) -> Option<Self> {
        let prop = component.get_property(names::RECURRENCE_ID)?;
        Some(Self {
            rid: Instant::from_value(&prop.value)?,
            range: prop.range(),
            component,
        })
    }
}

/// The override for an instant: an exact RECURRENCE-ID match, else the
/// nearest THISANDFUTURE at or before it, else the nearest THISANDPRIOR at or
/// after it.
fn find_override<'a>(
    overrides: &[Override<'a>],
    instant: &Instant,
    context: TimeContext<'_>,
) -> Option<&'a Component> {
    if let Some(exact) = overrides
        .iter()
        .find(|o| context.compare(&o.rid, instant) == Ordering::Equal)
    {
        return Some(exact.component);
    }
    let future = overrides
        .iter()
        .filter(|o| {
            o.range == Some(RecurrenceRange::ThisAndFuture)
                && context.compare(&o.rid, instant) == Ordering::Less
        })
        .max_by(|a, b| context.compare(&a.rid, &b.rid));
    let prior = || {
        overrides
            .iter()
            .filter(|o| {
                o.range == Some(RecurrenceRange::ThisAndPrior)
                    && context.compare(&o.rid, instant) == Ordering::Greater
            })
            .min_by(|a, b| context.compare(&a.rid, &b.rid))
    };
    future.or_else(prior).map(|o| o.component)
}

fn compare_occurrences(a: &Occurrence<'_>, b: &Occurrence<'_>, context: TimeContext<'_>) -> Ordering {
    match (&a.instant, &b.instant) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => context.compare(x, y),
    }
}

fn merge<'a>(streams: Vec<OccurrenceIter<'a>>, context: TimeContext<'a>) -> OccurrenceIter<'a> {
    if streams.len() == 1 {
        return streams.into_iter().next().unwrap_or_else(|| Box::new(std::iter::empty()));
    }
    let mut merger = Merger::new(move |a: &Occurrence<'a>, b: &Occurrence<'a>| {
        compare_occurrences(a, b, context)
    });
    for stream in streams {
        merger.push(stream, ());
    }
    Box::new(merger.map(|(occurrence, ())| occurrence))
}

/// Scans the members of one recurrence set.
fn scan_members<'a>(
    members: &[&'a Component],
    context: TimeContext<'a>,
    options: ExpansionOptions,
) -> Result<OccurrenceIter<'a>, ExpansionError> {
    let (overrides, bases): (Vec<&'a Component>, Vec<&'a Component>) =
        members.iter().copied().partition(|c| c.is_override());

    if bases.is_empty() {
        let mut orphans: Vec<(Option<Instant>, &'a Component)> = overrides
            .into_iter()
            .map(|c| {
                let start = c
                    .value(names::DTSTART)
                    .or_else(|| c.value(names::RECURRENCE_ID))
                    .and_then(Instant::from_value);
                (start, c)
            })
            .collect();
        orphans.sort_by(|a, b| match (&a.0, &b.0) {
            (Some(x), Some(y)) => context.compare(x, y),
            (x, y) => x.is_some().cmp(&y.is_some()),
        });
        return Ok(Box::new(orphans.into_iter().map(|(instant, base)| {
            Occurrence {
                instant,
                period_end: None,
                base,
                overriding: None,
            }
        })));
    }

    let overrides: Vec<Override<'a>> = overrides.into_iter().filter_map(Override::read).collect();
    let mut streams: Vec<OccurrenceIter<'a>> = Vec::with_capacity(bases.len());
    for base in bases {
        if !base.has_property(names::DTSTART) {
            streams.push(Box::new(std::iter::once(Occurrence {
                instant: None,
                period_end: None,
                base,
                overriding: None,
            })));
            continue;
        }
        let overrides = overrides.clone();
        let instants = base_instants(base, context, options)?;
        streams.push(Box::new(instants.map(move |(instant, period_end)| {
            let overriding = find_override(&overrides, &instant, context);
            Occurrence {
                instant: Some(instant),
                period_end,
                base,
                overriding,
            }
        })));
    }
    Ok(merge(streams, context))
}

/// Streams the occurrences of one UID in ascending order.
///
/// Bases without DTSTART come first with no instant. Overrides whose base is
/// missing are returned as they are, ordered by DTSTART.
///
/// ## Errors
/// Returns an error if a rule of the set cannot be expanded.
#[tracing::instrument(level = "debug", skip(calendar, context, options), fields(kind = %kind))]
pub fn scan_uid<'a>(
    calendar: &'a Calendar,
    kind: ComponentKind,
    uid: &str,
    context: TimeContext<'a>,
    options: ExpansionOptions,
) -> Result<OccurrenceIter<'a>, QueryError> {
    let members: Vec<&'a Component> = calendar
        .components_of_kind(kind)
        .filter(|c| c.uid() == Some(uid))
        .collect();
    scan_members(&members, context, options).map_err(QueryError::from)
}

/// Streams the occurrences of every component of one kind in ascending
/// order. Components without a UID are scanned on their own.
///
/// ## Errors
/// Returns an error if any rule cannot be expanded.
pub fn scan<'a>(
    calendar: &'a Calendar,
    kind: ComponentKind,
    context: TimeContext<'a>,
    options: ExpansionOptions,
) -> Result<OccurrenceIter<'a>, QueryError> {
    let anonymous: Vec<&Component> = calendar
        .components_of_kind(kind)
        .filter(|c| c.uid().is_none())
        .collect();
    scan_uids(calendar, kind, &calendar.uids(kind), &anonymous, context, options)
}

/// Merges the scans of the given UIDs and of the given components without
/// one, each of which is scanned on its own.
pub(super) fn scan_uids<'a>(
    calendar: &'a Calendar,
    kind: ComponentKind,
    uids: &[&str],
    anonymous: &[&'a Component],
    context: TimeContext<'a>,
    options: ExpansionOptions,
) -> Result<OccurrenceIter<'a>, QueryError> {
    let mut streams = Vec::with_capacity(uids.len() + anonymous.len());
    for uid in uids {
        streams.push(scan_uid(calendar, kind, uid, context, options)?);
    }
    for component in anonymous {
        streams.push(scan_members(&[*component], context, options)?);
    }
    Ok(merge(streams, context))
}

/// Properties that share the end slot of a component.
fn slot(name: &str) -> &str {
    match name {
        names::DTEND | names::DUE | names::DURATION => names::DTEND,
        other => other,
    }
}

fn is_rule(name: &str) -> bool {
    matches!(
        name,
        names::RRULE | names::EXRULE | names::RDATE | names::EXDATE
    )
}

/// Puts `prop` in place of the first property of its slot and drops the rest.
fn set_slot(props: &mut Vec<Property>, prop: Property) {
    let key = slot(&prop.name).to_string();
    match props.iter().position(|p| slot(&p.name) == key) {
        Some(at) => {
            props[at] = prop;
            let mut index = 0;
            props.retain(|p| {
                let keep = index <= at || slot(&p.name) != key;
                index += 1;
                keep
            });
        }
        None => props.push(prop),
    }
}

/// A DATE or DATE-TIME property for `instant`, carrying over the other
/// parameters of `template`.
fn dated_property(name: &str, instant: &Instant, template: Option<&Property>) -> Property {
    let mut tzid = match instant.form() {
        Some(DateTimeForm::Zoned { tzid }) => Some(Parameter::tzid(tzid.clone())),
        Some(DateTimeForm::Floating) => template.and_then(|t| t.get_param("TZID")).cloned(),
        _ => None,
    };
    let mut prop = property_with_value(name, instant.clone().into_value());
    for param in template.map_or(&[][..], |t| t.params.as_slice()) {
        if param.name.eq_ignore_ascii_case("TZID") {
            prop.params.extend(tzid.take());
        } else if !param.name.eq_ignore_ascii_case("VALUE")
            && !param.name.eq_ignore_ascii_case("RANGE")
        {
            prop.params.push(param.clone());
        }
    }
    prop.params.extend(tzid);
    prop
}

enum End<'c> {
    At(Instant, Option<&'c Property>),
    After(&'c Property),
}

/// The end of a source component moved by `from -> to`.
fn shifted_end<'c>(
    source: &'c Component,
    end_name: &str,
    from: &Instant,
    to: &Instant,
    context: TimeContext<'_>,
) -> Option<End<'c>> {
    if let Some(duration) = source.get_property(names::DURATION) {
        return Some(End::After(duration));
    }
    let prop = source
        .get_property(end_name)
        .or_else(|| source.get_property(names::DTEND))
        .or_else(|| source.get_property(names::DUE))?;
    let end = Instant::from_value(&prop.value)?;
    let moved = context.shift(&end, from, to).unwrap_or(end);
    Some(End::At(moved, Some(prop)))
}

/// Moves absolute VALARM triggers by `from -> to`.
fn shift_triggers(children: &mut [Component], from: &Instant, to: &Instant, context: TimeContext<'_>) {
    for alarm in children
        .iter_mut()
        .filter(|c| c.kind == ComponentKind::Alarm)
    {
        for prop in alarm
            .properties
            .iter_mut()
            .filter(|p| p.name == names::TRIGGER)
        {
            if let Value::DateTime(dt) = &prop.value
                && let Some(Instant::DateTime(moved)) =
                    context.shift(&Instant::DateTime(dt.clone()), from, to)
            {
                prop.value = Value::DateTime(moved);
            }
        }
    }
}

/// Builds the standalone component for one instance of `base`.
///
/// DTSTART becomes the instance (or the override's DTSTART, moved along for
/// a range override) and the end keeps its distance from the start. The
/// override's properties replace the base's by name, with DTEND, DUE and
/// DURATION counted as one. RRULE, EXRULE, RDATE and EXDATE are dropped, and
/// RECURRENCE-ID is set when the base recurs or an override applies.
#[must_use]
pub fn apply_override(
    base: &Component,
    instant: &Instant,
    period_end: Option<&Instant>,
    overriding: Option<&Component>,
    context: TimeContext<'_>,
) -> Component {
    let end_name = if base.kind == ComponentKind::Todo {
        names::DUE
    } else {
        names::DTEND
    };
    let base_start_prop = base.get_property(names::DTSTART);
    let base_start = base_start_prop
        .and_then(|p| Instant::from_value(&p.value))
        .unwrap_or_else(|| instant.clone());
    let override_rid = overriding
        .and_then(|o| o.value(names::RECURRENCE_ID))
        .and_then(Instant::from_value);

    let (start, start_template) = match overriding.and_then(|o| o.get_property(names::DTSTART)) {
        Some(prop) => {
            let declared = Instant::from_value(&prop.value).unwrap_or_else(|| instant.clone());
            let moved = override_rid
                .as_ref()
                .and_then(|rid| context.shift(&declared, rid, instant))
                .unwrap_or(declared);
            (moved, Some(prop))
        }
        None => (instant.clone(), base_start_prop),
    };

    let end = match period_end {
        Some(end) => Some(End::At(end.clone(), base.get_property(end_name))),
        None => overriding
            .and_then(|o| {
                let from = override_rid.as_ref()?;
                shifted_end(o, end_name, from, instant, context)
            })
            .or_else(|| shifted_end(base, end_name, &base_start, &start, context)),
    };

    let replaces = |name: &str| {
        overriding.is_some_and(|o| o.properties.iter().any(|p| slot(&p.name) == slot(name)))
    };
    let mut props: Vec<Property> = Vec::with_capacity(base.properties.len() + 3);
    for prop in base.properties.iter().filter(|p| !is_rule(&p.name)) {
        if !replaces(&prop.name) {
            props.push(prop.clone());
        } else if !props.iter().any(|p| slot(&p.name) == slot(&prop.name)) {
            let key = slot(&prop.name);
            props.extend(
                overriding
                    .into_iter()
                    .flat_map(|o| o.properties.iter())
                    .filter(|p| slot(&p.name) == key)
                    .cloned(),
            );
        }
    }
    for prop in overriding
        .into_iter()
        .flat_map(|o| o.properties.iter())
        .filter(|p| !is_rule(&p.name))
    {
        if !props.iter().any(|p| slot(&p.name) == slot(&prop.name)) {
            props.push(prop.clone());
        }
    }
    let recurs = base.has_property(names::RRULE) || base.has_property(names::RDATE);
    if recurs || overriding.is_some() {
        set_slot(
            &mut props,
            dated_property(names::RECURRENCE_ID, instant, base_start_prop),
        );
    }
    set_slot(
        &mut props,
        dated_property(names::DTSTART, &start, start_template),
    );
    match end {
        Some(End::At(end, template)) => {
            let name = template.map_or(end_name, |t| t.name.as_str());
            set_slot(&mut props, dated_property(name, &end, template));
        }
        Some(End::After(duration)) => set_slot(&mut props, duration.clone()),
        None => props.retain(|p| slot(&p.name) != names::DTEND),
    }

    let children = match overriding.filter(|o| !o.children.is_empty()) {
        Some(o) => {
            let mut children = o.children.clone();
            if let Some(rid) = &override_rid {
                shift_triggers(&mut children, rid, instant, context);
            }
            children
        }
        None => {
            let mut children = base.children.clone();
            shift_triggers(&mut children, &base_start, &start, context);
            children
        }
    };

    Component {
        kind: base.kind,
        name: base.name.clone(),
        properties: props,
        children,
    }
}

/// Finds overrides without RANGE whose RECURRENCE-ID is not an instance of
/// their base.
#[must_use]
pub fn check_overrides(calendar: &Calendar, floating: FloatingZone) -> Vec<ValidationError> {
    let context = TimeContext::new(calendar.timezones(), floating);
    let mut issues = Vec::new();
    for kind in ComponentKind::SCHEDULABLE {
        for component in calendar.components_of_kind(kind) {
            let Some(found) = Override::read(component) else {
                continue;
            };
            let Some(uid) = component.uid() else {
                continue;
            };
            if found.range.is_some() {
                continue;
            }

            let mut bases = calendar.components_of_kind(kind).filter(|c| {
                c.uid() == Some(uid) && !c.is_override() && c.has_property(names::DTSTART)
            });
            let mut seen_base = false;
            let matched = bases.any(|base| {
                seen_base = true;
                match base_instants(base, context, ExpansionOptions::default()) {
                    Ok(instants) => instants
                        .take_while(|(i, _)| context.compare(i, &found.rid) != Ordering::Greater)
                        .any(|(i, _)| context.compare(&i, &found.rid) == Ordering::Equal),
                    Err(_) => true,
                }
            });
            if seen_base && !matched {
                tracing::warn!(
                    uid,
                    recurrence_id = %found.rid,
                    "override matches no instance of its base"
                );
                issues.push(ValidationError::UnmatchedOverride {
                    component: kind.to_string(),
                    uid: uid.to_string(),
                    recurrence_id: found.rid.to_string(),
                });
            }
        }
    }
    issues
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
