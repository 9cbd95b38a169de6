//! Content line folding (RFC 5545 §3.1).

/// Longest physical line in octets, CRLF excluded.
const MAX_LINE_OCTETS: usize = 75;

/// Folds a logical line into CRLF-terminated physical lines of at most 75
/// octets. Continuations start with one space. UTF-8 sequences are never
/// split.
#[must_use]
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return format!("{line}\r\n");
    }

    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3 + 2);
    let mut width = 0;
    for c in line.chars() {
        let size = c.len_utf8();
        if width + size > MAX_LINE_OCTETS {
            folded.push_str("\r\n ");
            width = 1;
        }
        folded.push(c);
        width += size;
    }
    folded.push_str("\r\n");
    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::parse::unfold;

    fn physical(folded: &str) -> Vec<&str> {
        folded.split("\r\n").filter(|s| !s.is_empty()).collect()
    }

    #[test]
    fn short_lines_are_terminated() {
        assert_eq!(fold_line("SUMMARY:Short"), "SUMMARY:Short\r\n");
        let exact = "X".repeat(75);
        assert_eq!(fold_line(&exact), format!("{exact}\r\n"));
    }

    #[test]
    fn long_lines_fold_at_75_octets() {
        let line = "A".repeat(80);
        let folded = fold_line(&line);
        let lines = physical(&folded);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 75);
        assert_eq!(lines[1], format!(" {}", "A".repeat(5)));
        assert!(lines.iter().all(|l| l.len() <= 75));
    }

    #[test]
    fn multibyte_characters_stay_whole() {
        let line = format!("{}日本語", "A".repeat(73));
        let folded = fold_line(&line);
        let lines = physical(&folded);
        assert_eq!(lines[0], "A".repeat(73));
        assert!(lines.iter().all(|l| l.len() <= 75));
    }

    #[test]
    fn unfolding_restores_the_line() {
        let line = format!("DESCRIPTION:{}", "ünïcödé text ".repeat(20));
        let folded = fold_line(&line);
        let unfolded: Vec<String> = unfold(&folded).map(|(line, _)| line).collect();
        assert_eq!(unfolded, [line]);
    }
}
