use sweep_core::indent::{is_blank, strip_indent};
use sweep_core::TextRange;

use crate::edit::{apply_edits, normalize_edits, EditError, TextEdit};
use crate::snippet::EntityMatch;

/// Result of splicing a snippet's entities into one file's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceOutcome {
    pub new_text: String,
    /// Names of the declarations that were replaced.
    pub replaced: Vec<String>,
    /// Snippet entities with no counterpart in the target.
    pub not_found: Vec<String>,
}

/// Rewrite `entity_text` from its own base indentation to `target_ws`.
///
/// The entity's internal relative indentation is preserved; only the
/// base level changes. The first line is emitted bare; the target
/// file's text up to the span start already carries its indentation.
pub fn reindent(entity_text: &str, base_ws: &str, target_ws: &str) -> String {
    let mut out = String::with_capacity(entity_text.len());
    for (i, line) in entity_text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !is_blank(line) {
                out.push_str(target_ws);
            }
        }
        if is_blank(line) {
            continue;
        }
        out.push_str(if i == 0 { line } else { strip_indent(line, base_ws) });
    }
    out
}

/// Splice each matched entity's text over its target span.
///
/// This is a structural text splice, not a semantic merge: the result
/// is not reparsed, and the file's trailing-newline convention is
/// untouched (declaration spans never include the final newline).
pub fn splice_matches(file_text: &str, matches: &[EntityMatch]) -> Result<SpliceOutcome, EditError> {
    let mut edits: Vec<TextEdit> = Vec::new();
    let mut replaced = Vec::new();
    let mut not_found = Vec::new();

    for m in matches {
        match &m.target {
            Some(target) => {
                let replacement =
                    reindent(&m.entity.text, &m.entity.decl.leading_ws, &target.leading_ws);
                edits.push(TextEdit::replace(
                    TextRange::new(target.range.start, target.range.end),
                    replacement,
                ));
                replaced.push(target.name.clone());
            }
            None => not_found.push(m.entity.decl.name.clone()),
        }
    }

    normalize_edits(&mut edits)?;
    let new_text = apply_edits(file_text, &edits)?;

    Ok(SpliceOutcome {
        new_text,
        replaced,
        not_found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippet::{dedent, match_entities, snippet_entities};
    use pretty_assertions::assert_eq;
    use sweep_syntax::{parse, DeclarationIndex};

    fn splice(file: &str, snippet: &str) -> SpliceOutcome {
        let target_tree = parse(file).unwrap();
        let target_index = DeclarationIndex::of(&target_tree);
        let snippet_tree = parse(&dedent(snippet)).unwrap();
        let entities = snippet_entities(&snippet_tree).unwrap();
        let matches = match_entities(entities, &target_index).unwrap();
        splice_matches(file, &matches).unwrap()
    }

    #[test]
    fn reindent_preserves_relative_indentation() {
        let entity = "def m(self):\n    if x:\n        return 1\n    return 2";
        let out = reindent(entity, "", "    ");
        assert_eq!(
            out,
            "def m(self):\n        if x:\n            return 1\n        return 2"
        );
    }

    #[test]
    fn reindent_leaves_blank_lines_empty() {
        let entity = "def m(self):\n\n    pass";
        assert_eq!(reindent(entity, "", "    "), "def m(self):\n\n        pass");
    }

    #[test]
    fn replaces_exactly_the_target_span() {
        let file = "# header\ndef greet():\n    return \"hi\"\n\nafter = 1\n";
        let out = splice(file, "def greet():\n    return \"hello\"\n");
        assert_eq!(
            out.new_text,
            "# header\ndef greet():\n    return \"hello\"\n\nafter = 1\n"
        );
        assert_eq!(out.replaced, vec!["greet".to_string()]);
        assert!(out.not_found.is_empty());
    }

    #[test]
    fn module_level_snippet_lands_reindented_on_method() {
        let file = "class C:\n    def m(self):\n        return 1\n\ntail = 0\n";
        let out = splice(file, "def m(self):\n    return 2\n");
        assert_eq!(
            out.new_text,
            "class C:\n    def m(self):\n        return 2\n\ntail = 0\n"
        );
    }

    #[test]
    fn unmatched_entities_leave_file_untouched() {
        let file = "def a():\n    pass\n";
        let out = splice(file, "def a():\n    pass\n\ndef missing():\n    pass\n");
        assert_eq!(out.not_found, vec!["missing".to_string()]);
        assert_eq!(out.replaced, vec!["a".to_string()]);
    }

    #[test]
    fn file_without_trailing_newline_stays_that_way() {
        let file = "def greet():\n    return \"hi\"";
        let out = splice(file, "def greet():\n    return \"hello\"\n");
        assert_eq!(out.new_text, "def greet():\n    return \"hello\"");
    }

    #[test]
    fn multiple_entities_replace_independent_spans() {
        let file = "def a():\n    return 1\n\ndef b():\n    return 2\n";
        let out = splice(file, "def a():\n    return 10\n\ndef b():\n    return 20\n");
        assert_eq!(
            out.new_text,
            "def a():\n    return 10\n\ndef b():\n    return 20\n"
        );
    }
}
