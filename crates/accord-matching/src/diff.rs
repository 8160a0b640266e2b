//! Human-readable diffs attached to mismatches.
//!
//! Diffs are for display only and never feed into a match decision.

use serde_json::Value;
use similar::{Algorithm, ChangeTag, TextDiff};
use std::fmt;

/// One line of a rendered diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Removed(String),
    Added(String),
}

impl DiffLine {
    pub fn is_change(&self) -> bool {
        !matches!(self, DiffLine::Context(_))
    }
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffLine::Context(line) => write!(f, " {}", line),
            DiffLine::Removed(line) => write!(f, "-{}", line),
            DiffLine::Added(line) => write!(f, "+{}", line),
        }
    }
}

/// Line diff of `expected` against `actual`.
///
/// Unchanged runs are reduced to the lines directly bordering a change.
pub fn line_diff(expected: &str, actual: &str) -> Vec<DiffLine> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Lcs)
        .diff_lines(expected, actual);

    let changes: Vec<(ChangeTag, String)> = diff
        .iter_all_changes()
        .map(|change| {
            let line = change.value().trim_end_matches('\n').trim_end_matches('\r');
            (change.tag(), line.to_string())
        })
        .collect();

    let is_change = |i: usize| {
        changes
            .get(i)
            .is_some_and(|(tag, _)| *tag != ChangeTag::Equal)
    };

    changes
        .iter()
        .enumerate()
        .filter_map(|(i, (tag, line))| match tag {
            ChangeTag::Delete => Some(DiffLine::Removed(line.clone())),
            ChangeTag::Insert => Some(DiffLine::Added(line.clone())),
            ChangeTag::Equal => {
                let borders_change = (i > 0 && is_change(i - 1)) || is_change(i + 1);
                borders_change.then(|| DiffLine::Context(line.clone()))
            }
        })
        .collect()
}

pub fn render(lines: &[DiffLine]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty-printed JSON with object keys in sorted order.
pub fn canonical_text(value: &Value) -> String {
    serde_json::to_string_pretty(&canonical(value)).unwrap_or_else(|_| value.to_string())
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(entries) => {
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort();
            Value::Object(
                keys.into_iter()
                    .map(|key| (key.clone(), canonical(&entries[key])))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

/// Rendered line diff of two values in canonical form.
pub fn structural_diff(expected: &Value, actual: &Value) -> String {
    render(&line_diff(&canonical_text(expected), &canonical_text(actual)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_text_has_no_diff() {
        assert!(line_diff("a\nb\n", "a\nb\n").is_empty());
    }

    #[test]
    fn test_context_collapses_to_bordering_lines() {
        let expected = "1\n2\n3\n4\n5\n6\n";
        let actual = "1\n2\n3\nX\n5\n6\n";
        let lines = line_diff(expected, actual);
        assert_eq!(
            lines,
            vec![
                DiffLine::Context("3".to_string()),
                DiffLine::Removed("4".to_string()),
                DiffLine::Added("X".to_string()),
                DiffLine::Context("5".to_string()),
            ]
        );
    }

    #[test]
    fn test_reverse_diff_swaps_counts() {
        let a = "a\nb\nc\nd\n";
        let b = "a\nc\ne\nf\n";
        let count = |lines: &[DiffLine]| {
            (
                lines.iter().filter(|l| matches!(l, DiffLine::Removed(_))).count(),
                lines.iter().filter(|l| matches!(l, DiffLine::Added(_))).count(),
            )
        };
        let (removed, added) = count(&line_diff(a, b));
        let (removed_back, added_back) = count(&line_diff(b, a));
        assert_eq!(removed, added_back);
        assert_eq!(added, removed_back);
    }

    #[test]
    fn test_structural_diff_sorts_keys() {
        let expected = json!({"b": 1, "a": 2});
        let actual = json!({"a": 2, "b": 3});
        let diff = structural_diff(&expected, &actual);
        assert!(diff.contains("-  \"b\": 1"));
        assert!(diff.contains("+  \"b\": 3"));
        assert!(diff.starts_with("   \"a\": 2,"));
    }

    #[test]
    fn test_render_prefixes() {
        let lines = vec![
            DiffLine::Context("x".to_string()),
            DiffLine::Removed("y".to_string()),
            DiffLine::Added("z".to_string()),
        ];
        assert_eq!(render(&lines), " x\n-y\n+z");
    }
}
