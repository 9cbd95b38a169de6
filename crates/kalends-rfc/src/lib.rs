//! iCalendar (RFC 5545) parsing, recurrence expansion, time-range queries
//! and serialization.

pub mod error;
pub mod rfc;
