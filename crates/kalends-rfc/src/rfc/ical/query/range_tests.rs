use super::*;
use crate::rfc::ical::parse::parse;
use chrono::{NaiveDate, NaiveDateTime};

fn wrap(body: &str) -> String {
    format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//EN\r\n{body}END:VCALENDAR\r\n")
}

fn at(d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn window(from: (u32, u32), to: (u32, u32)) -> TimeRange {
    TimeRange::between(at(from.0, from.1), at(to.0, to.1)).unwrap()
}

fn summaries(calendar: &Calendar) -> Vec<String> {
    calendar
        .components()
        .iter()
        .map(|c| c.summary().unwrap_or("-").to_string())
        .collect()
}

fn start_of(component: &Component) -> NaiveDateTime {
    component
        .value(names::DTSTART)
        .and_then(Instant::from_value)
        .unwrap()
        .local()
}

const DAILY: &str = "\
BEGIN:VEVENT\r\n\
UID:daily\r\n\
DTSTAMP:20240101T000000Z\r\n\
DTSTART:20240101T090000Z\r\n\
DTEND:20240101T100000Z\r\n\
RRULE:FREQ=DAILY;COUNT=5\r\n\
SUMMARY:Stand-up\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:daily\r\n\
DTSTAMP:20240101T000000Z\r\n\
RECURRENCE-ID:20240103T090000Z\r\n\
DTSTART:20240103T130000Z\r\n\
DTEND:20240103T140000Z\r\n\
SUMMARY:Planning\r\n\
END:VEVENT\r\n";

#[test_log::test]
fn expand_builds_one_component_per_instance() {
    let calendar = parse(&wrap(DAILY)).unwrap();
    let query = Query::new().mode(RecurrenceMode::Expand(window((2, 0), (4, 0))));
    let result = time_range(&calendar, &query).unwrap();

    assert_eq!(summaries(&result), ["Stand-up", "Planning"]);
    let starts: Vec<_> = result.components().iter().map(start_of).collect();
    assert_eq!(starts, [at(2, 9), at(3, 13)]);
    assert!(result.components().iter().all(|c| !c.has_property(names::RRULE)));
    assert_eq!(result.prodid(), Some("-//Test//EN"));
}

#[test]
fn limit_keeps_base_and_matching_overrides() {
    let calendar = parse(&wrap(DAILY)).unwrap();

    let query = Query::new().mode(RecurrenceMode::Limit(window((3, 12), (3, 15))));
    let result = time_range(&calendar, &query).unwrap();
    assert_eq!(summaries(&result), ["Stand-up", "Planning"]);
    assert!(result.components()[0].has_property(names::RRULE));

    // The override's original slot still counts.
    let query = Query::new().mode(RecurrenceMode::Limit(window((3, 9), (3, 10))));
    let result = time_range(&calendar, &query).unwrap();
    assert_eq!(summaries(&result), ["Stand-up", "Planning"]);

    let query = Query::new().mode(RecurrenceMode::Limit(window((5, 0), (6, 0))));
    let result = time_range(&calendar, &query).unwrap();
    assert_eq!(summaries(&result), ["Stand-up"]);
}

#[test]
fn plain_range_filters_sets() {
    let body = format!(
        "{DAILY}BEGIN:VTODO\r\n\
UID:todo\r\n\
DTSTAMP:20240101T000000Z\r\n\
DUE:20240120T000000Z\r\n\
SUMMARY:Taxes\r\n\
END:VTODO\r\n"
    );
    let calendar = parse(&wrap(&body)).unwrap();

    let result = time_range(&calendar, &Query::new().range(window((10, 0), (11, 0)))).unwrap();
    assert!(result.components().is_empty());

    let result = time_range(&calendar, &Query::new().range(window((19, 0), (21, 0)))).unwrap();
    assert_eq!(summaries(&result), ["Taxes"]);

    let query = Query::new()
        .kind(ComponentKind::Event)
        .range(window((1, 0), (31, 0)));
    let result = time_range(&calendar, &query).unwrap();
    assert_eq!(summaries(&result), ["Stand-up", "Planning"]);
}

#[test]
fn open_ended_includes_unbounded_sets() {
    let calendar = parse(&wrap(
        "BEGIN:VEVENT\r\n\
UID:forever\r\n\
DTSTAMP:20240101T000000Z\r\n\
DTSTART:20240101T090000Z\r\n\
RRULE:FREQ=WEEKLY\r\n\
SUMMARY:Weekly\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:forever\r\n\
DTSTAMP:20240101T000000Z\r\n\
RECURRENCE-ID:20240108T090000Z\r\n\
DTSTART:20240108T100000Z\r\n\
SUMMARY:Moved\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:forever\r\n\
DTSTAMP:20240101T000000Z\r\n\
RECURRENCE-ID:20240129T090000Z\r\n\
DTSTART:20240129T100000Z\r\n\
SUMMARY:Later\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:once\r\n\
DTSTAMP:20240101T000000Z\r\n\
DTSTART:20240102T090000Z\r\n\
SUMMARY:Once\r\n\
END:VEVENT\r\n",
    ))
    .unwrap();

    let query = Query::new().range(TimeRange::starting(at(20, 0)));
    let result = time_range(&calendar, &query).unwrap();
    assert_eq!(summaries(&result), ["Weekly", "Later"]);

    let query = Query::new().range(TimeRange::ending(at(3, 0)));
    let result = time_range(&calendar, &query).unwrap();
    assert_eq!(summaries(&result), ["Weekly", "Once"]);
}

#[test_log::test]
fn open_ended_keeps_unbounded_sets_without_uid() {
    let calendar = parse(&wrap(
        "BEGIN:VEVENT\r\n\
DTSTAMP:20240101T000000Z\r\n\
DTSTART:20240101T090000Z\r\n\
RRULE:FREQ=DAILY\r\n\
SUMMARY:Anonymous\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
DTSTAMP:20240101T000000Z\r\n\
DTSTART:20240102T090000Z\r\n\
SUMMARY:Past\r\n\
END:VEVENT\r\n",
    ))
    .unwrap();

    let query = Query::new().range(TimeRange::starting(at(20, 0)));
    let result = time_range(&calendar, &query).unwrap();
    assert_eq!(summaries(&result), ["Anonymous"]);
}

#[test]
fn alarms_select_components() {
    let calendar = parse(&wrap(
        "BEGIN:VEVENT\r\n\
UID:alarmed\r\n\
DTSTAMP:20240101T000000Z\r\n\
DTSTART:20240101T090000Z\r\n\
DURATION:PT1H\r\n\
RRULE:FREQ=DAILY;COUNT=3\r\n\
SUMMARY:Reminded\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
DESCRIPTION:Soon\r\n\
TRIGGER:-PT15M\r\n\
END:VALARM\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
DESCRIPTION:Over\r\n\
TRIGGER;RELATED=END:PT0S\r\n\
END:VALARM\r\n\
END:VEVENT\r\n",
    ))
    .unwrap();

    let hit = TimeRange::between(
        at(2, 8) + chrono::TimeDelta::minutes(40),
        at(2, 8) + chrono::TimeDelta::minutes(50),
    )
    .unwrap();
    let result = alarm_range(&calendar, None, hit, FloatingZone::default()).unwrap();
    assert_eq!(summaries(&result), ["Reminded"]);
    let kept = &result.components()[0];
    assert_eq!(kept.children.len(), 1);
    assert_eq!(
        kept.children[0].value(names::DESCRIPTION).and_then(Value::as_text),
        Some("Soon")
    );
    assert!(kept.has_property(names::RRULE));

    let miss = window((4, 0), (5, 0));
    let result = alarm_range(&calendar, None, miss, FloatingZone::default()).unwrap();
    assert!(result.components().is_empty());

    let query = Query::new()
        .alarms(hit)
        .mode(RecurrenceMode::Expand(window((1, 0), (4, 0))));
    let result = time_range(&calendar, &query).unwrap();
    assert_eq!(result.components().len(), 1);
    let expanded = &result.components()[0];
    assert_eq!(start_of(expanded), at(2, 9));
    assert_eq!(expanded.children.len(), 1);
}

#[test]
fn malformed_and_trivial_queries() {
    let calendar = parse(&wrap(DAILY)).unwrap();
    let query = Query::new().mode(RecurrenceMode::Expand(TimeRange::ending(at(2, 0))));
    assert_eq!(
        time_range(&calendar, &query),
        Err(QueryError::Unbounded { mode: "expand" })
    );
    assert_eq!(time_range(&calendar, &Query::new()), Ok(calendar.clone()));
}

#[test]
fn freebusy_periods_are_limited() {
    let calendar = parse(&wrap(
        "BEGIN:VFREEBUSY\r\n\
UID:fb\r\n\
DTSTAMP:20240101T000000Z\r\n\
FREEBUSY:20240102T090000Z/PT1H\r\n\
FREEBUSY;FBTYPE=BUSY-TENTATIVE:20240105T090000Z/20240105T100000Z\r\n\
END:VFREEBUSY\r\n",
    ))
    .unwrap();
    let limited = limit_freebusy(&calendar, window((4, 0), (6, 0)), FloatingZone::default());
    let fb = &limited.components()[0];
    assert_eq!(fb.count_properties(names::FREEBUSY), 1);
    assert_eq!(
        fb.get_property(names::FREEBUSY)
            .and_then(|p| p.get_param_value("FBTYPE")),
        Some("BUSY-TENTATIVE")
    );
    assert!(fb.has_property(names::UID));
}

#[test]
fn zoned_values_become_utc() {
    let calendar = parse(&wrap(
        "BEGIN:VEVENT\r\n\
UID:zoned\r\n\
DTSTAMP:20240101T000000Z\r\n\
DTSTART;TZID=America/New_York:20240101T090000\r\n\
EXDATE;TZID=America/New_York:20240102T090000,20240103T090000\r\n\
RRULE:FREQ=DAILY;COUNT=3\r\n\
END:VEVENT\r\n",
    ))
    .unwrap();
    let converted = to_utc(&calendar);
    let event = &converted.components()[0];

    let start = event.get_property(names::DTSTART).unwrap();
    assert_eq!(start.get_param("TZID"), None);
    assert_eq!(
        start.value,
        Value::DateTime(DateTime::utc(at(1, 14)))
    );
    let exdates: Vec<_> = event
        .value(names::EXDATE)
        .unwrap()
        .items()
        .filter_map(Value::as_datetime)
        .map(|dt| (dt.local, dt.is_utc()))
        .collect();
    assert_eq!(exdates, [(at(2, 14), true), (at(3, 14), true)]);
    assert!(converted.timezones().is_empty());
}
