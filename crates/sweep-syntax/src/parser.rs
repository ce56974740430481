use sweep_core::{LineIndex, TextRange};
use thiserror::Error;
use tree_sitter::Node;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The text does not conform to the grammar. Positions are
    /// one-based for display.
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: u32, column: u32 },
    /// The grammar could not be loaded into the parser. This indicates
    /// a build misconfiguration, not bad input.
    #[error("python grammar unavailable: {0}")]
    Grammar(String),
}

/// A parsed source text together with its syntax tree.
///
/// Owns a copy of the text so spans can be rendered back without the
/// caller keeping the original string alive.
#[derive(Debug)]
pub struct SyntaxTree {
    text: String,
    tree: tree_sitter::Tree,
}

impl SyntaxTree {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Renders the source text covered by `range`.
    ///
    /// Panics if `range` is out of bounds or not on char boundaries;
    /// ranges produced by the locator are always valid for this tree.
    pub fn render(&self, range: TextRange) -> &str {
        &self.text[range.start..range.end]
    }
}

/// Parse Python source text.
///
/// A tree containing ERROR or MISSING nodes is treated as a failed
/// parse: structural operations need spans they can trust, so a
/// best-effort tree is not useful here.
pub fn parse(text: &str) -> Result<SyntaxTree, ParseError> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::language())
        .map_err(|err| ParseError::Grammar(err.to_string()))?;

    let tree = parser
        .parse(text, None)
        .ok_or_else(|| ParseError::Grammar("parser returned no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        let node = first_error(root).unwrap_or(root);
        let pos = node.start_position();
        return Err(ParseError::Syntax {
            line: pos.row as u32 + 1,
            column: pos.column as u32 + 1,
        });
    }

    Ok(SyntaxTree {
        text: text.to_string(),
        tree,
    })
}

/// Depth-first search for the first ERROR or MISSING node.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    for child in children {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    // `has_error` was set but no descendant claimed it; report this node.
    Some(node)
}

/// Byte range of `node` within its source text.
pub(crate) fn node_range(node: Node<'_>) -> TextRange {
    TextRange::new(node.start_byte(), node.end_byte())
}

/// The indentation prefix of the line `node` starts on.
pub(crate) fn leading_whitespace(text: &str, index: &LineIndex, node: Node<'_>) -> String {
    let start = node.start_byte();
    let line = index.line_col(start).line;
    let line_start = index.line_start(line).unwrap_or(start);
    text[line_start..start].to_string()
}
