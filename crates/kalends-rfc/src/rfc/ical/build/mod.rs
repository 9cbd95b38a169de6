//! iCalendar serialization (RFC 5545).
//!
//! - Escape: TEXT value escaping
//! - Fold: content line folding at 75 octets
//! - Serializer: the lazy content line stream and the folded document

mod escape;
mod fold;
mod serializer;

pub use escape::escape_text;
pub use fold::fold_line;
pub use serializer::{
    content_lines, format_property, format_value, serialize, serialize_component,
};
