//! Line-level diff rendering
//!
//! Computes a unified diff between the pre- and post-patch line sequences
//! so the user can see exactly what a patch did. Pure computation; the
//! colored rendering lives in [`crate::output`].

use similar::{ChangeTag, TextDiff};

/// A single line in the rendered diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Add(String),
    Remove(String),
}

/// Number of unchanged lines shown around each change.
const CONTEXT_LINES: usize = 3;

/// Diff two line sequences (lines keep their trailing newline, as stored in
/// a [`crate::source::Snapshot`]). Identical inputs yield an empty diff.
pub fn render(before: &[String], after: &[String]) -> Vec<DiffLine> {
    let old = before.concat();
    let new = after.concat();
    let diff = TextDiff::from_lines(old.as_str(), new.as_str());

    let mut out = Vec::new();
    for group in diff.grouped_ops(CONTEXT_LINES) {
        for op in group {
            for change in diff.iter_changes(&op) {
                let text = change.value().trim_end_matches('\n').to_string();
                out.push(match change.tag() {
                    ChangeTag::Insert => DiffLine::Add(text),
                    ChangeTag::Delete => DiffLine::Remove(text),
                    ChangeTag::Equal => DiffLine::Context(text),
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| format!("{s}\n")).collect()
    }

    #[test]
    fn test_identical_sequences_yield_empty_diff() {
        let content = lines(&["a", "b", "c"]);
        assert!(render(&content, &content).is_empty());
        // And again, to make sure rendering has no hidden state.
        assert!(render(&content, &content).is_empty());
    }

    #[test]
    fn test_replace_shows_remove_then_add() {
        let before = lines(&["a", "b", "c"]);
        let after = lines(&["a", "x", "c"]);
        let diff = render(&before, &after);
        assert!(diff.contains(&DiffLine::Remove("b".to_string())));
        assert!(diff.contains(&DiffLine::Add("x".to_string())));
        assert!(diff.contains(&DiffLine::Context("a".to_string())));
    }

    #[test]
    fn test_distant_changes_skip_unchanged_middle() {
        let mut raw: Vec<String> = (0..40).map(|i| format!("line {i}\n")).collect();
        let before = raw.clone();
        raw[0] = "changed top\n".to_string();
        raw[39] = "changed bottom\n".to_string();
        let diff = render(&before, &raw);

        let context_count = diff
            .iter()
            .filter(|l| matches!(l, DiffLine::Context(_)))
            .count();
        // Two hunks with at most 3 context lines each side.
        assert!(context_count <= 12, "got {context_count} context lines");
        assert!(diff.contains(&DiffLine::Add("changed top".to_string())));
        assert!(diff.contains(&DiffLine::Add("changed bottom".to_string())));
    }

    #[test]
    fn test_pure_insertion() {
        let before = lines(&["a", "b"]);
        let after = lines(&["a", "b", "z"]);
        let diff = render(&before, &after);
        assert!(diff.contains(&DiffLine::Add("z".to_string())));
        assert!(!diff.iter().any(|l| matches!(l, DiffLine::Remove(_))));
    }
}
