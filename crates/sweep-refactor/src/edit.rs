use sweep_core::TextRange;
use thiserror::Error;

/// A single range replacement within one file's text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
    pub range: TextRange,
    pub replacement: String,
}

impl TextEdit {
    pub fn replace(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range,
            replacement: text.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("invalid text range {start}..{end}")]
    InvalidRange { start: usize, end: usize },
    #[error("overlapping edits: {first_start}..{first_end} overlaps {second_start}..{second_end}")]
    OverlappingEdits {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },
    #[error("edit range {start}..{end} is outside the text bounds (len={len})")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("offset {offset} is not a UTF-8 character boundary")]
    InvalidUtf8Boundary { offset: usize },
}

/// Sort edits, drop exact duplicates, and validate non-overlap.
pub fn normalize_edits(edits: &mut Vec<TextEdit>) -> Result<(), EditError> {
    edits.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then_with(|| a.range.end.cmp(&b.range.end))
            .then_with(|| a.replacement.cmp(&b.replacement))
    });
    edits.dedup();

    let mut prev: Option<TextRange> = None;
    for edit in edits.iter() {
        if edit.range.start > edit.range.end {
            return Err(EditError::InvalidRange {
                start: edit.range.start,
                end: edit.range.end,
            });
        }
        if let Some(prev_range) = prev {
            if edit.range.start < prev_range.end {
                return Err(EditError::OverlappingEdits {
                    first_start: prev_range.start,
                    first_end: prev_range.end,
                    second_start: edit.range.start,
                    second_end: edit.range.end,
                });
            }
        }
        prev = Some(edit.range);
    }

    Ok(())
}

/// Apply a set of non-overlapping edits to `original`.
///
/// Edits are applied back-to-front so earlier ranges stay valid.
pub fn apply_edits(original: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(original.to_string());
    }

    let mut sorted = edits.to_vec();
    sorted.sort_by(|a, b| {
        b.range
            .start
            .cmp(&a.range.start)
            .then_with(|| b.range.end.cmp(&a.range.end))
    });

    let mut out = original.to_string();
    for edit in sorted {
        let len = out.len();
        if edit.range.end > len || edit.range.start > edit.range.end {
            return Err(EditError::OutOfBounds {
                start: edit.range.start,
                end: edit.range.end,
                len,
            });
        }
        for offset in [edit.range.start, edit.range.end] {
            if !out.is_char_boundary(offset) {
                return Err(EditError::InvalidUtf8Boundary { offset });
            }
        }

        out.replace_range(edit.range.start..edit.range.end, &edit.replacement);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn applies_multiple_edits_back_to_front() {
        let edits = vec![
            TextEdit::replace(TextRange::new(0, 3), "cat"),
            TextEdit::replace(TextRange::new(8, 11), "hat"),
        ];
        assert_eq!(apply_edits("dog and dog", &edits).unwrap(), "cat and hat");
    }

    #[test]
    fn normalize_rejects_overlap() {
        let mut edits = vec![
            TextEdit::replace(TextRange::new(0, 5), "a"),
            TextEdit::replace(TextRange::new(3, 8), "b"),
        ];
        let err = normalize_edits(&mut edits).unwrap_err();
        assert_eq!(
            err,
            EditError::OverlappingEdits {
                first_start: 0,
                first_end: 5,
                second_start: 3,
                second_end: 8,
            }
        );
    }

    #[test]
    fn normalize_deduplicates_identical_edits() {
        let mut edits = vec![
            TextEdit::replace(TextRange::new(1, 2), "x"),
            TextEdit::replace(TextRange::new(1, 2), "x"),
        ];
        normalize_edits(&mut edits).unwrap();
        assert_eq!(edits.len(), 1);
    }

    #[test]
    fn out_of_bounds_is_reported_not_panicked() {
        let edits = vec![TextEdit::replace(TextRange::new(0, 10), "x")];
        let err = apply_edits("abc", &edits).unwrap_err();
        assert_eq!(
            err,
            EditError::OutOfBounds {
                start: 0,
                end: 10,
                len: 3
            }
        );
    }

    #[test]
    fn non_char_boundary_is_reported_not_panicked() {
        // `é` is 2 bytes; offset 2 falls inside it.
        let edits = vec![TextEdit::replace(TextRange::new(2, 3), "x")];
        let err = apply_edits("aé", &edits).unwrap_err();
        assert_eq!(err, EditError::InvalidUtf8Boundary { offset: 2 });
    }
}
