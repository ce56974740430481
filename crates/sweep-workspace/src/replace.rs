use regex::Regex;

use crate::WorkspaceError;

/// A compiled search pattern. Compiling validates regex syntax before
/// any file is read, so a bad pattern can never leave a batch half
/// previewed.
pub(crate) enum SearchPattern {
    Literal(String),
    Regex(Regex),
}

impl SearchPattern {
    pub(crate) fn compile(pattern: &str, is_regex: bool) -> Result<Self, WorkspaceError> {
        if pattern.is_empty() {
            return Err(WorkspaceError::EmptyPattern);
        }
        if is_regex {
            let regex = Regex::new(pattern).map_err(WorkspaceError::Regex)?;
            Ok(SearchPattern::Regex(regex))
        } else {
            Ok(SearchPattern::Literal(pattern.to_string()))
        }
    }

    /// Replace every occurrence, or `None` when the text has no match.
    /// Regex replacements expand `$1`-style capture references.
    pub(crate) fn replace_all(&self, text: &str, replacement: &str) -> Option<String> {
        match self {
            SearchPattern::Literal(needle) => {
                if text.contains(needle.as_str()) {
                    Some(text.replace(needle.as_str(), replacement))
                } else {
                    None
                }
            }
            SearchPattern::Regex(regex) => {
                if regex.is_match(text) {
                    Some(regex.replace_all(text, replacement).into_owned())
                } else {
                    None
                }
            }
        }
    }
}
