//! iCalendar component types (RFC 5545 §3.4-3.6).

use std::sync::Arc;

use super::{Property, Value, names};
use crate::rfc::ical::expand::{Timezone, TimezoneTable, VTimezoneError};

/// Component kind for iCalendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// VCALENDAR wrapper component.
    Calendar,
    /// VEVENT component.
    Event,
    /// VTODO component.
    Todo,
    /// VJOURNAL component.
    Journal,
    /// VFREEBUSY component.
    FreeBusy,
    /// VTIMEZONE component.
    Timezone,
    /// VALARM component (nested within VEVENT/VTODO).
    Alarm,
    /// STANDARD sub-component of VTIMEZONE.
    Standard,
    /// DAYLIGHT sub-component of VTIMEZONE.
    Daylight,
    /// X- or unrecognised component; the name is kept on the component.
    Other,
}

impl ComponentKind {
    /// Component kinds a time-range query scans, in scan order.
    pub const SCHEDULABLE: [Self; 4] = [Self::Event, Self::Todo, Self::Journal, Self::FreeBusy];

    /// Returns the string name for this component kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "VCALENDAR",
            Self::Event => "VEVENT",
            Self::Todo => "VTODO",
            Self::Journal => "VJOURNAL",
            Self::FreeBusy => "VFREEBUSY",
            Self::Timezone => "VTIMEZONE",
            Self::Alarm => "VALARM",
            Self::Standard => "STANDARD",
            Self::Daylight => "DAYLIGHT",
            Self::Other => "X-UNKNOWN",
        }
    }

    /// Parses a component kind from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "VCALENDAR" => Self::Calendar,
            "VEVENT" => Self::Event,
            "VTODO" => Self::Todo,
            "VJOURNAL" => Self::Journal,
            "VFREEBUSY" => Self::FreeBusy,
            "VTIMEZONE" => Self::Timezone,
            "VALARM" => Self::Alarm,
            "STANDARD" => Self::Standard,
            "DAYLIGHT" => Self::Daylight,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An iCalendar component.
///
/// Properties keep insertion order and a name may repeat. Children are owned.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Component kind.
    pub kind: ComponentKind,
    /// Component name as written (upper-case).
    pub name: String,
    /// Properties in order of appearance.
    pub properties: Vec<Property>,
    /// Nested sub-components.
    pub children: Vec<Component>,
}

impl Component {
    /// Creates a new component with the given kind.
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            name: kind.as_str().to_string(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a component from its BEGIN name, keeping X- names.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into().to_ascii_uppercase();
        Self {
            kind: ComponentKind::parse(&name),
            name,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds a property.
    pub fn add_property(&mut self, prop: Property) {
        self.properties.push(prop);
    }

    /// Adds a property, builder style.
    #[must_use]
    pub fn with_property(mut self, prop: Property) -> Self {
        self.properties.push(prop);
        self
    }

    /// Adds a child component.
    pub fn add_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Returns the first property with the given name.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Returns every property with the given name, in order.
    pub fn get_properties<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> {
        self.properties.iter().filter(move |p| p.name == name)
    }

    /// Returns the value of the first property with the given name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get_property(name).map(|p| &p.value)
    }

    /// Returns true if the component has a property with the given name.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.get_property(name).is_some()
    }

    /// Counts the properties with the given name.
    #[must_use]
    pub fn count_properties(&self, name: &str) -> usize {
        self.get_properties(name).count()
    }

    /// Returns the UID.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.value(names::UID).and_then(Value::as_text)
    }

    /// Returns the SUMMARY.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.value(names::SUMMARY).and_then(Value::as_text)
    }

    /// Returns true if this component overrides an instance of a recurrence set.
    #[must_use]
    pub fn is_override(&self) -> bool {
        self.has_property(names::RECURRENCE_ID)
    }

    /// Returns the children of the given kind.
    pub fn children_of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &Self> {
        self.children.iter().filter(move |c| c.kind == kind)
    }
}

/// A parsed VCALENDAR with its timezone table.
///
/// The table is shared read-only by every component of the calendar and by
/// query results derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    /// The VCALENDAR component.
    pub root: Component,
    timezones: Arc<TimezoneTable>,
}

impl Calendar {
    /// Creates an empty calendar with PRODID and VERSION.
    #[must_use]
    pub fn new(prodid: impl Into<String>) -> Self {
        let root = Component::new(ComponentKind::Calendar)
            .with_property(Property::text(names::PRODID, prodid))
            .with_property(Property::text(names::VERSION, "2.0"));
        Self {
            root,
            timezones: Arc::new(TimezoneTable::default()),
        }
    }

    /// Wraps a VCALENDAR component and an existing timezone table.
    #[must_use]
    pub fn from_parts(root: Component, timezones: Arc<TimezoneTable>) -> Self {
        Self { root, timezones }
    }

    /// Returns the timezone table.
    #[must_use]
    pub fn timezones(&self) -> &TimezoneTable {
        &self.timezones
    }

    /// Returns a shared handle to the timezone table.
    #[must_use]
    pub fn shared_timezones(&self) -> Arc<TimezoneTable> {
        Arc::clone(&self.timezones)
    }

    /// Adds a top-level component. VTIMEZONEs are registered in the table.
    ///
    /// ## Errors
    /// Returns an error if a VTIMEZONE cannot be turned into an offset provider.
    pub fn add_component(&mut self, component: Component) -> Result<(), VTimezoneError> {
        if component.kind == ComponentKind::Timezone {
            let tz = Timezone::from_component(&component)?;
            Arc::make_mut(&mut self.timezones).register(tz);
        }
        self.root.add_child(component);
        Ok(())
    }

    /// Returns PRODID.
    #[must_use]
    pub fn prodid(&self) -> Option<&str> {
        self.root.value(names::PRODID).and_then(Value::as_text)
    }

    /// Returns VERSION.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.root.value(names::VERSION).and_then(Value::as_text)
    }

    /// Returns the top-level components.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.root.children
    }

    /// Returns the top-level components of one kind.
    pub fn components_of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &Component> {
        self.root.children_of_kind(kind)
    }

    /// Returns the distinct UIDs of one component kind, in first-seen order.
    #[must_use]
    pub fn uids(&self, kind: ComponentKind) -> Vec<&str> {
        let mut uids: Vec<&str> = Vec::new();
        for uid in self.components_of_kind(kind).filter_map(Component::uid) {
            if !uids.contains(&uid) {
                uids.push(uid);
            }
        }
        uids
    }
}
