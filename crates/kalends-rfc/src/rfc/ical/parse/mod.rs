//! iCalendar parsing (RFC 5545).
//!
//! - Lexer: line unfolding and content line tokenizing
//! - Values: parsers for each value type
//! - Registry: accepted value types per property and the fallback trial
//! - Parser: the BEGIN/END tree builder

mod error;
mod lexer;
mod parser;
mod registry;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{Unfolder, parse_content_line, unfold};
pub use parser::{ParseOptions, Parsed, parse, parse_lines, parse_reader, parse_with};
pub use registry::{
    accepted_types, default_type, delimiter, is_registered, parse_property_value, parse_value,
    property_with_value,
};
pub use values::{
    parse_binary, parse_boolean, parse_date, parse_datetime, parse_duration, parse_float,
    parse_integer, parse_period, parse_recur, parse_time, parse_utc_offset, unescape_text,
};
