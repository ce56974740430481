//! Structural replace machinery: text edits, snippet matching, and the
//! span splice that swaps a declaration for its snippet counterpart.
//!
//! Everything here is a pure function over text and parsed trees; disk
//! I/O lives with the change session in `sweep-workspace`.

mod edit;
mod preview;
mod snippet;
mod splice;

pub use edit::{apply_edits, normalize_edits, EditError, TextEdit};
pub use preview::unified_diff;
pub use snippet::{
    dedent, match_entities, snippet_entities, EntityMatch, SnippetEntity, SnippetError,
};
pub use splice::{reindent, splice_matches, SpliceOutcome};
