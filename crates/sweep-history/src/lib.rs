//! Commit history with undo/redo.
//!
//! Every committed session is snapshotted to disk as full before/after
//! file contents, so undo and redo are plain writes rather than inverse
//! edits. The undo stack is rebuilt from the snapshot store on open;
//! the redo stack lives only for the lifetime of the process.

mod store;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use store::SnapshotStore;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bad history manifest at {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Full content of one file on both sides of a commit.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    pub path: PathBuf,
    pub before: String,
    pub after: String,
}

/// Everything needed to reverse (or re-apply) one committed session.
#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub session_id: String,
    pub label: String,
    pub committed_at_ms: u64,
    pub files: Vec<FileSnapshot>,
}

/// What an undo or redo wrote back, for reporting.
#[derive(Debug, Clone)]
pub struct HistoryReport {
    pub session_id: String,
    pub label: String,
    pub files: Vec<PathBuf>,
}

pub struct History {
    store: SnapshotStore,
    undo: Vec<UndoRecord>,
    redo: Vec<UndoRecord>,
}

impl History {
    /// Open the store under `root` and rebuild the undo stack from the
    /// persisted sessions, oldest first.
    pub fn open(root: &Path) -> Result<Self, HistoryError> {
        let store = SnapshotStore::open(root)?;
        let undo = store.load()?;
        tracing::debug!(
            target: "sweep.history",
            sessions = undo.len(),
            root = %root.display(),
            "replayed history"
        );
        Ok(Self {
            store,
            undo,
            redo: Vec::new(),
        })
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Record a freshly committed session. Clears the redo stack: a new
    /// commit forks the timeline and the undone sessions no longer
    /// describe the files on disk.
    pub fn record(&mut self, record: UndoRecord) -> Result<(), HistoryError> {
        self.store.persist(&record)?;
        self.undo.push(record);
        self.redo.clear();
        Ok(())
    }

    /// Write back the `before` contents of the most recent session.
    ///
    /// On a write failure the session stays on the undo stack so a
    /// retry is possible.
    pub fn undo(&mut self) -> Result<HistoryReport, HistoryError> {
        let record = self.undo.last().ok_or(HistoryError::NothingToUndo)?;
        let files = restore(record, Side::Before)?;
        let record = match self.undo.pop() {
            Some(record) => record,
            None => return Err(HistoryError::NothingToUndo),
        };
        let report = report_for(&record, files);
        self.redo.push(record);
        Ok(report)
    }

    /// Write back the `after` contents of the most recently undone
    /// session.
    pub fn redo(&mut self) -> Result<HistoryReport, HistoryError> {
        let record = self.redo.last().ok_or(HistoryError::NothingToRedo)?;
        let files = restore(record, Side::After)?;
        let record = match self.redo.pop() {
            Some(record) => record,
            None => return Err(HistoryError::NothingToRedo),
        };
        let report = report_for(&record, files);
        self.undo.push(record);
        Ok(report)
    }
}

enum Side {
    Before,
    After,
}

fn restore(record: &UndoRecord, side: Side) -> Result<Vec<PathBuf>, HistoryError> {
    let mut written = Vec::with_capacity(record.files.len());
    for file in &record.files {
        let content = match side {
            Side::Before => &file.before,
            Side::After => &file.after,
        };
        sweep_core::fs::atomic_write(&file.path, content.as_bytes()).map_err(|source| {
            HistoryError::Io {
                path: file.path.clone(),
                source,
            }
        })?;
        written.push(file.path.clone());
    }
    Ok(written)
}

fn report_for(record: &UndoRecord, files: Vec<PathBuf>) -> HistoryReport {
    HistoryReport {
        session_id: record.session_id.clone(),
        label: record.label.clone(),
        files,
    }
}
