use similar::TextDiff;

/// Render a unified diff for one file, `a/`/`b/` headers included.
///
/// Returns an empty string when the texts are identical so callers can
/// skip unchanged files cheaply.
pub fn unified_diff(path: &str, original: &str, modified: &str) -> String {
    if original == modified {
        return String::new();
    }

    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_produce_empty_diff() {
        assert_eq!(unified_diff("f.py", "same\n", "same\n"), "");
    }

    #[test]
    fn diff_carries_headers_and_hunks() {
        let diff = unified_diff("pkg/f.py", "old_name = 1\n", "new_name = 1\n");
        assert!(diff.starts_with("--- a/pkg/f.py\n+++ b/pkg/f.py\n"));
        assert!(diff.contains("-old_name = 1"));
        assert!(diff.contains("+new_name = 1"));
    }
}
