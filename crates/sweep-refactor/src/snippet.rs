use sweep_core::indent::{is_blank, leading_whitespace};
use sweep_syntax::{DeclKind, Declaration, DeclarationIndex, ParseError, SyntaxTree};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnippetError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The snippet parsed but defines no function or class.
    #[error("snippet does not define a function or class")]
    NoEntities,
    /// The target file has more than one declaration matching a snippet
    /// entity's (name, kind). Picking one silently risks replacing the
    /// wrong code, so the whole operation is rejected.
    #[error("\"{name}\" is ambiguous in the target: {count} {kind} declarations match")]
    AmbiguousTarget {
        name: String,
        kind: &'static str,
        count: usize,
    },
    /// Two snippet entities resolve to nested targets, e.g. a class and
    /// one of its own methods. Replacing the class span already rewrites
    /// the method, so applying both is contradictory.
    #[error("\"{inner}\" is declared inside \"{outer}\"; their replacements overlap")]
    NestedTargets { outer: String, inner: String },
}

/// One named definition carried by a pasted snippet, together with its
/// own source text. Never persisted; scoped to a single preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetEntity {
    pub decl: Declaration,
    pub text: String,
}

/// A snippet entity paired with its counterpart in the target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMatch {
    pub entity: SnippetEntity,
    /// `None` means "not found in target": a no-op for this entity, not
    /// an error for the operation.
    pub target: Option<Declaration>,
}

/// Strips the common leading whitespace of all non-blank lines.
///
/// Pasted snippets often arrive with a base indentation (a method
/// copied out of its class); Python rejects indented module-level code,
/// so the snippet is dedented before parsing. Relative indentation is
/// preserved.
pub fn dedent(text: &str) -> String {
    let common: Option<&str> = text
        .lines()
        .filter(|line| !is_blank(line))
        .map(leading_whitespace)
        .min_by_key(|ws| ws.len());
    let Some(common) = common.filter(|ws| !ws.is_empty()) else {
        return text.to_string();
    };
    let common = common.to_string();

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(nl) = rest.find('\n') {
        let line = &rest[..nl];
        out.push_str(strip_line(line, &common));
        out.push('\n');
        rest = &rest[nl + 1..];
    }
    out.push_str(strip_line(rest, &common));
    out
}

fn strip_line<'a>(line: &'a str, common: &str) -> &'a str {
    if is_blank(line) {
        line
    } else {
        line.strip_prefix(common).unwrap_or(line)
    }
}

/// Extract the module-level entities a parsed snippet defines.
pub fn snippet_entities(tree: &SyntaxTree) -> Result<Vec<SnippetEntity>, SnippetError> {
    let index = DeclarationIndex::of(tree);
    let entities: Vec<SnippetEntity> = index
        .top_level()
        .map(|decl| SnippetEntity {
            decl: decl.clone(),
            text: tree.render(decl.range).to_string(),
        })
        .collect();

    if entities.is_empty() {
        return Err(SnippetError::NoEntities);
    }
    Ok(entities)
}

/// Pair each snippet entity with its target declaration by (name, kind).
///
/// A snippet's top-level `def` may land either on a module-level
/// function or on a class method (the "method pasted at module level"
/// case); if both exist under one name the match is ambiguous. Classes
/// only ever match classes.
pub fn match_entities(
    entities: Vec<SnippetEntity>,
    target: &DeclarationIndex,
) -> Result<Vec<EntityMatch>, SnippetError> {
    let mut matches = Vec::with_capacity(entities.len());

    for entity in entities {
        let candidates: Vec<&Declaration> = target
            .decls()
            .iter()
            .filter(|d| d.name == entity.decl.name && kind_matches(entity.decl.kind, d.kind))
            .collect();

        match candidates.len() {
            0 => matches.push(EntityMatch {
                entity,
                target: None,
            }),
            1 => {
                let target_decl = candidates[0].clone();
                matches.push(EntityMatch {
                    entity,
                    target: Some(target_decl),
                });
            }
            count => {
                return Err(SnippetError::AmbiguousTarget {
                    name: entity.decl.name,
                    kind: entity.decl.kind.as_str(),
                    count,
                });
            }
        }
    }

    reject_nested_targets(&matches)?;
    Ok(matches)
}

fn reject_nested_targets(matches: &[EntityMatch]) -> Result<(), SnippetError> {
    for (i, a) in matches.iter().enumerate() {
        let Some(first) = &a.target else { continue };
        for b in &matches[i + 1..] {
            let Some(second) = &b.target else { continue };
            let (outer, inner) = if first.range.contains_range(second.range) {
                (first, second)
            } else if second.range.contains_range(first.range) {
                (second, first)
            } else {
                continue;
            };
            return Err(SnippetError::NestedTargets {
                outer: outer.name.clone(),
                inner: inner.name.clone(),
            });
        }
    }
    Ok(())
}

fn kind_matches(snippet: DeclKind, target: DeclKind) -> bool {
    match snippet {
        DeclKind::Function | DeclKind::Method => {
            matches!(target, DeclKind::Function | DeclKind::Method)
        }
        DeclKind::Class => target == DeclKind::Class,
    }
}
