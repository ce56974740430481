//! Python syntax layer: parsing and declaration indexing.
//!
//! This crate wraps a single tree-sitter grammar (Python) behind a small
//! adapter. Parsing is pure: text in, tree out, no I/O. Files that fail
//! to parse are reported with the first error position so callers can
//! exclude them from structural operations without aborting a batch.

mod locator;
mod parser;

pub use locator::{DeclKind, Declaration, DeclarationIndex, Enclosing};
pub use parser::{parse, ParseError, SyntaxTree};
