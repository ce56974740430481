use sweep_core::{LineIndex, TextRange};
use tree_sitter::Node;

use crate::parser::{leading_whitespace, node_range, SyntaxTree};

/// What a named declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Function,
    Class,
    Method,
}

impl DeclKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Function => "function",
            DeclKind::Class => "class",
            DeclKind::Method => "method",
        }
    }
}

/// Whether a declaration sits at module level or inside a class body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enclosing {
    Module,
    Nested,
}

/// One named declaration in a source text.
///
/// `range` covers the declaration's full extent, decorators included.
/// `leading_ws` is the indentation prefix of the first line and is NOT
/// part of `range`, so a replacement can re-apply the correct base
/// indentation to the new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    pub range: TextRange,
    pub enclosing: Enclosing,
    pub leading_ws: String,
}

/// Ordered index of the named declarations in one parsed text.
///
/// Declarations appear in source order (sorted by start offset). Spans
/// of siblings are disjoint; a method's span is contained in its class's
/// span. Duplicate names are kept as-is; disambiguation is the
/// matcher's concern, not the locator's.
#[derive(Debug, Clone, Default)]
pub struct DeclarationIndex {
    decls: Vec<Declaration>,
}

impl DeclarationIndex {
    pub fn of(tree: &SyntaxTree) -> Self {
        let text = tree.text();
        let line_index = LineIndex::new(text);
        let mut decls = Vec::new();

        let root = tree.root();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            collect(child, text, &line_index, Enclosing::Module, &mut decls);
        }

        debug_assert!(decls.windows(2).all(|w| w[0].range.start <= w[1].range.start));
        Self { decls }
    }

    pub fn decls(&self) -> &[Declaration] {
        &self.decls
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Module-level declarations only (the spans that partition the file).
    pub fn top_level(&self) -> impl Iterator<Item = &Declaration> {
        self.decls.iter().filter(|d| d.enclosing == Enclosing::Module)
    }

    /// Rebuilds the source by concatenating inter-span and span text of
    /// the module-level declarations. Always byte-identical to the
    /// original; used to validate span bookkeeping in tests.
    pub fn reconstruct(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;
        for decl in self.top_level() {
            out.push_str(&text[pos..decl.range.start]);
            out.push_str(&text[decl.range.start..decl.range.end]);
            pos = decl.range.end;
        }
        out.push_str(&text[pos..]);
        out
    }
}

fn collect(
    node: Node<'_>,
    text: &str,
    line_index: &LineIndex,
    enclosing: Enclosing,
    out: &mut Vec<Declaration>,
) {
    // A decorated definition's span covers the decorators too, so a
    // replacement swaps them along with the body.
    let (def, span_node) = match node.kind() {
        "decorated_definition" => match node.child_by_field_name("definition") {
            Some(inner) => (inner, node),
            None => return,
        },
        "function_definition" | "class_definition" => (node, node),
        _ => return,
    };

    match def.kind() {
        "function_definition" => {
            let Some(name) = field_text(def, "name", text) else {
                return;
            };
            let kind = match enclosing {
                Enclosing::Module => DeclKind::Function,
                Enclosing::Nested => DeclKind::Method,
            };
            out.push(declaration(name, kind, span_node, text, line_index, enclosing));
            // Function bodies are not recursed into: nested functions are
            // not match targets.
        }
        "class_definition" => {
            let Some(name) = field_text(def, "name", text) else {
                return;
            };
            out.push(declaration(
                name,
                DeclKind::Class,
                span_node,
                text,
                line_index,
                enclosing,
            ));
            if let Some(body) = def.child_by_field_name("body") {
                let mut cursor = body.walk();
                for stmt in body.named_children(&mut cursor) {
                    collect(stmt, text, line_index, Enclosing::Nested, out);
                }
            }
        }
        _ => {}
    }
}

fn declaration(
    name: String,
    kind: DeclKind,
    span_node: Node<'_>,
    text: &str,
    line_index: &LineIndex,
    enclosing: Enclosing,
) -> Declaration {
    Declaration {
        name,
        kind,
        range: node_range(span_node),
        enclosing,
        leading_ws: leading_whitespace(text, line_index, span_node),
    }
}

fn field_text(node: Node<'_>, field: &str, text: &str) -> Option<String> {
    let child = node.child_by_field_name(field)?;
    text.get(child.start_byte()..child.end_byte())
        .map(str::to_string)
}
