//! Command-line front end for the kalends iCalendar engine.

pub mod cli;
pub mod error;
pub mod run;
