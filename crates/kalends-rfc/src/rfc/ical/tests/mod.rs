//! iCalendar fixtures and cross-module tests: parse/serialize round trips
//! and recurrence scenarios from parse through query.
