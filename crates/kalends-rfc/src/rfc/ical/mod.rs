//! iCalendar RFC 5545 implementation.
//!
//! - `core`: the component tree, properties, parameters and typed values
//! - `parse`: unfolding, content-line tokenizing and tree building
//! - `validate`: per-component schema and cross-field rules
//! - `expand`: timezone resolution, RRULE expansion and sorted merging
//! - `query`: recurrence sets, overrides and CalDAV time-range filtering
//! - `build`: serialization back to folded content lines
//!
//! ## Example
//!
//! ```rust
//! use kalends_rfc::rfc::ical::{Calendar, Component, ComponentKind, Property, parse, serialize};
//!
//! let mut calendar = Calendar::new("-//My App//EN");
//! let event = Component::new(ComponentKind::Event)
//!     .with_property(Property::text("UID", "my-event-1"))
//!     .with_property(Property::text("DTSTAMP", "20240101T000000Z"))
//!     .with_property(Property::text("SUMMARY", "Team Meeting"));
//! calendar.add_component(event).unwrap();
//!
//! let text = serialize(&calendar);
//! let again = parse(&text).unwrap();
//! assert_eq!(again.components().len(), 1);
//! ```

pub mod build;
pub mod core;
pub mod expand;
pub mod parse;
pub mod query;
pub mod validate;

#[cfg(test)]
mod tests;

pub use build::serialize;
pub use core::{Calendar, Component, ComponentKind, Parameter, Property, Value};
pub use expand::{ExpansionError, ExpansionOptions, FloatingZone, TimeContext, expand};
pub use parse::{ParseError, ParseOptions, ParseResult, parse, parse_with};
pub use query::{Query, QueryError, RecurrenceMode, TimeRange, time_range};
pub use validate::ValidationError;
