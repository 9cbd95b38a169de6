//! iCalendar core models (RFC 5545).
//!
//! The tree the parser builds and the serializer writes:
//! - Round-trip fidelity: unknown properties, parameters and components are kept
//! - Typed values: every property value is parsed into a [`Value`]
//! - Ordered storage: properties and children keep source order

mod component;
mod datetime;
mod duration;
mod parameter;
mod property;
mod recur;
mod value;

pub use component::{Calendar, Component, ComponentKind};
pub use datetime::{DateTime, DateTimeForm, Time, UtcOffset, format_date};
pub use duration::Duration;
pub use parameter::{Parameter, QUOTED_PARAMETERS, RecurrenceRange, TriggerRelated};
pub use property::{ContentLine, Property, names};
pub use recur::{Frequency, Recur, RecurUntil, RulePart, Weekday, WeekdayNum};
pub use value::{Period, Value, ValueType};
