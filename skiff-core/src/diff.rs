//! Display Diff
//!
//! Renders a line-by-line preview of a pending overwrite. Display only;
//! nothing in the write path depends on it.

use similar::{ChangeTag, TextDiff};

/// Render a unified-style diff between the current and proposed contents.
pub fn render_diff(old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);

    let mut out = String::from("--- current\n+++ proposed\n");
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => ' ',
        };
        out.push(sign);
        out.push_str(change.value());
        if !change.value().ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_line_shows_both_sides() {
        let rendered = render_diff("a\nb\nc\n", "a\nB\nc\n");
        assert!(rendered.starts_with("--- current\n+++ proposed\n"));
        assert!(rendered.contains("-b\n"));
        assert!(rendered.contains("+B\n"));
        assert!(rendered.contains(" a\n"));
    }

    #[test]
    fn added_lines_are_marked_inserts() {
        let rendered = render_diff("a\n", "a\nb\n");
        assert!(rendered.contains("+b\n"));
        assert!(!rendered.contains("-a\n"));
    }

    #[test]
    fn handles_missing_trailing_newline() {
        let rendered = render_diff("a", "b");
        assert!(rendered.contains("-a\n"));
        assert!(rendered.contains("+b\n"));
    }
}
