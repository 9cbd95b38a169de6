//! Property cardinality tables per component kind (RFC 5545 §3.6).

use crate::rfc::ical::core::ComponentKind;

/// How often a property may appear in one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly once; absence or repetition is an error.
    Key,
    /// Exactly once by RFC 5545; absence is only logged.
    Required,
    /// At most once.
    Once,
    /// Any number of times.
    Many,
}

/// The property table of one component kind.
#[derive(Debug)]
pub struct Schema {
    pub key: &'static [&'static str],
    pub required: &'static [&'static str],
    pub once: &'static [&'static str],
    pub many: &'static [&'static str],
}

impl Schema {
    /// Returns the cardinality of a property, or `None` if the component
    /// does not list it.
    #[must_use]
    pub fn cardinality(&self, name: &str) -> Option<Cardinality> {
        if self.key.contains(&name) {
            Some(Cardinality::Key)
        } else if self.required.contains(&name) {
            Some(Cardinality::Required)
        } else if self.once.contains(&name) {
            Some(Cardinality::Once)
        } else if self.many.contains(&name) {
            Some(Cardinality::Many)
        } else {
            None
        }
    }

    /// Iterates the properties that must be present.
    pub fn mandatory(&self) -> impl Iterator<Item = (&'static str, Cardinality)> {
        self.key
            .iter()
            .map(|n| (*n, Cardinality::Key))
            .chain(self.required.iter().map(|n| (*n, Cardinality::Required)))
    }
}

const EVENT_MANY: &[&str] = &[
    "RRULE",
    "EXRULE",
    "ATTACH",
    "ATTENDEE",
    "CATEGORIES",
    "COMMENT",
    "CONTACT",
    "EXDATE",
    "REQUEST-STATUS",
    "RELATED-TO",
    "RESOURCES",
    "RDATE",
];

const OBSERVANCE: Schema = Schema {
    key: &["DTSTART", "TZOFFSETTO", "TZOFFSETFROM"],
    required: &[],
    once: &[],
    many: &["RRULE", "COMMENT", "RDATE", "TZNAME"],
};

static CALENDAR: Schema = Schema {
    key: &["PRODID", "VERSION"],
    required: &[],
    once: &["CALSCALE", "METHOD"],
    many: &[],
};

static EVENT: Schema = Schema {
    key: &[],
    required: &["DTSTAMP", "UID"],
    once: &[
        "DTSTART",
        "CLASS",
        "CREATED",
        "DESCRIPTION",
        "GEO",
        "LAST-MODIFIED",
        "LOCATION",
        "ORGANIZER",
        "PRIORITY",
        "SEQUENCE",
        "STATUS",
        "SUMMARY",
        "TRANSP",
        "URL",
        "RECURRENCE-ID",
        "DTEND",
        "DURATION",
    ],
    many: EVENT_MANY,
};

static TODO: Schema = Schema {
    key: &[],
    required: &["DTSTAMP", "UID"],
    once: &[
        "CLASS",
        "COMPLETED",
        "CREATED",
        "DESCRIPTION",
        "DTSTART",
        "GEO",
        "LAST-MODIFIED",
        "LOCATION",
        "ORGANIZER",
        "PERCENT-COMPLETE",
        "PRIORITY",
        "RECURRENCE-ID",
        "SEQUENCE",
        "STATUS",
        "SUMMARY",
        "URL",
        "DUE",
        "DURATION",
    ],
    many: EVENT_MANY,
};

static JOURNAL: Schema = Schema {
    key: &[],
    required: &["DTSTAMP", "UID"],
    once: &[
        "CLASS",
        "CREATED",
        "DTSTART",
        "LAST-MODIFIED",
        "ORGANIZER",
        "RECURRENCE-ID",
        "SEQUENCE",
        "STATUS",
        "SUMMARY",
        "URL",
    ],
    many: &[
        "RRULE",
        "EXRULE",
        "ATTACH",
        "ATTENDEE",
        "CATEGORIES",
        "COMMENT",
        "CONTACT",
        "DESCRIPTION",
        "EXDATE",
        "RELATED-TO",
        "RDATE",
        "REQUEST-STATUS",
    ],
};

static FREEBUSY: Schema = Schema {
    key: &[],
    required: &["DTSTAMP", "UID"],
    once: &["CONTACT", "DTSTART", "DTEND", "DURATION", "ORGANIZER", "URL"],
    many: &["ATTENDEE", "COMMENT", "FREEBUSY", "REQUEST-STATUS"],
};

static TIMEZONE: Schema = Schema {
    key: &["TZID"],
    required: &[],
    once: &["LAST-MODIFIED", "TZURL"],
    many: &[],
};

static STANDARD: Schema = OBSERVANCE;
static DAYLIGHT: Schema = OBSERVANCE;

static ALARM: Schema = Schema {
    key: &["ACTION", "TRIGGER"],
    required: &[],
    once: &["DESCRIPTION", "SUMMARY", "DURATION", "REPEAT"],
    many: &["ATTENDEE", "ATTACH"],
};

/// Returns the table of a component kind; X- components have none.
#[must_use]
pub fn schema_for(kind: ComponentKind) -> Option<&'static Schema> {
    Some(match kind {
        ComponentKind::Calendar => &CALENDAR,
        ComponentKind::Event => &EVENT,
        ComponentKind::Todo => &TODO,
        ComponentKind::Journal => &JOURNAL,
        ComponentKind::FreeBusy => &FREEBUSY,
        ComponentKind::Timezone => &TIMEZONE,
        ComponentKind::Alarm => &ALARM,
        ComponentKind::Standard => &STANDARD,
        ComponentKind::Daylight => &DAYLIGHT,
        ComponentKind::Other => return None,
    })
}
