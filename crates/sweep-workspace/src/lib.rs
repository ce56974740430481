//! Workspace layer: configuration, scanning, change sessions, and the
//! commit/undo/redo surface over the refactor, format, and history
//! crates.

mod config;
mod replace;
mod scan;
mod session;
mod workspace;

use std::path::PathBuf;

use thiserror::Error;

pub use config::{WorkspaceConfig, CONFIG_FILE_NAME};
pub use scan::{ScanFailure, ScanReport, ScannedFile};
pub use session::{ChangeSession, FileChange, SessionOp, SessionState, SkippedFile};
pub use sweep_history::HistoryReport;
pub use workspace::{CommitReport, Workspace};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bad config at {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("bad include pattern `{pattern}`: {source}")]
    IncludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("search pattern is empty")]
    EmptyPattern,
    #[error("invalid regex: {0}")]
    Regex(#[source] regex::Error),
    #[error("{path} does not parse: {source}")]
    TargetParse {
        path: PathBuf,
        #[source]
        source: sweep_syntax::ParseError,
    },
    #[error(transparent)]
    Snippet(#[from] sweep_refactor::SnippetError),
    #[error(transparent)]
    Edit(#[from] sweep_refactor::EditError),
    #[error(transparent)]
    Format(#[from] sweep_format::FormatError),
    #[error(transparent)]
    History(#[from] sweep_history::HistoryError),
    #[error("session {id} is not pending")]
    SessionNotPending { id: String },
}
