//! TEXT escaping (RFC 5545 §3.3.11).

/// Escapes a TEXT value: backslash, semicolon, comma and line breaks.
///
/// A CRLF pair becomes a single `\n`.
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 8);
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {
                chars.next_if_eq(&'\n');
                escaped.push_str("\\n");
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
