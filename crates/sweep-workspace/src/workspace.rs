use std::path::{Path, PathBuf};
use std::time::Duration;

use rayon::prelude::*;
use sweep_core::fs::atomic_write;
use sweep_format::{strip_trailing_semicolons, CommandFormatter, Formatter};
use sweep_history::{FileSnapshot, History, HistoryError, HistoryReport, UndoRecord};
use sweep_refactor::{
    dedent, match_entities, snippet_entities, splice_matches, unified_diff,
};
use sweep_syntax::{parse, DeclarationIndex};

use crate::config::WorkspaceConfig;
use crate::replace::SearchPattern;
use crate::scan::{self, ScanReport, ScannedFile};
use crate::session::{now_ms, ChangeSession, FileChange, SessionOp, SessionState, SkippedFile};
use crate::WorkspaceError;

/// What a commit wrote.
#[derive(Debug)]
pub struct CommitReport {
    pub session_id: String,
    pub files_written: Vec<PathBuf>,
}

/// The front door: owns the configuration, the formatter, and the
/// history, and turns scans into previewable sessions.
pub struct Workspace {
    root: PathBuf,
    config: WorkspaceConfig,
    formatter: Box<dyn Formatter>,
    history: History,
}

impl Workspace {
    pub fn open(root: &Path) -> Result<Self, WorkspaceError> {
        let config = WorkspaceConfig::load(root)?;
        let formatter = CommandFormatter::new(
            &config.formatter_command,
            Duration::from_secs(config.formatter_timeout_secs),
        )?;
        Self::with_formatter(root, config, Box::new(formatter))
    }

    /// Open with an injected formatter. The CLI goes through [`open`];
    /// this seam exists so the formatter can be swapped for a fake.
    ///
    /// [`open`]: Workspace::open
    pub fn with_formatter(
        root: &Path,
        config: WorkspaceConfig,
        formatter: Box<dyn Formatter>,
    ) -> Result<Self, WorkspaceError> {
        let history = History::open(&config.history_root(root))?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            formatter,
            history,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Snapshot every matching file under the root.
    pub fn scan(&self) -> Result<ScanReport, WorkspaceError> {
        scan::scan(&self.root, &self.config)
    }

    /// Preview a find/replace over the scanned files. The pattern is
    /// validated before any file is inspected; files without a match do
    /// not appear in the session.
    pub fn preview_text_replace(
        &self,
        files: &[ScannedFile],
        pattern: &str,
        replacement: &str,
        is_regex: bool,
    ) -> Result<ChangeSession, WorkspaceError> {
        let pattern = SearchPattern::compile(pattern, is_regex)?;

        let mut session = ChangeSession::new(SessionOp::TextReplace);
        for file in files {
            if let Some(new_text) = pattern.replace_all(&file.text, replacement) {
                session.changes.push(self.change(file, new_text));
            }
        }
        tracing::info!(
            target: "sweep.workspace",
            session = %session.id,
            changed = session.changes.len(),
            scanned = files.len(),
            "previewed text replace"
        );
        Ok(session)
    }

    /// Preview replacing declarations in one target file with their
    /// counterparts from a pasted snippet.
    ///
    /// The snippet is dedented, optionally formatted, and parsed; its
    /// module-level entities are matched against the target by
    /// (name, kind). Snippet entities with no counterpart become
    /// warnings on the session. A target that does not parse is an
    /// error, as is an ambiguous match.
    pub fn preview_snippet_replace(
        &self,
        target: &ScannedFile,
        snippet_text: &str,
        format_snippet: bool,
    ) -> Result<ChangeSession, WorkspaceError> {
        let mut snippet = dedent(snippet_text.trim_end());
        if format_snippet {
            snippet = self.formatter.format(&snippet)?;
        }
        let snippet_tree = parse(&snippet).map_err(sweep_refactor::SnippetError::from)?;
        let entities = snippet_entities(&snippet_tree)?;

        let tree = parse(&target.text).map_err(|source| WorkspaceError::TargetParse {
            path: target.path.clone(),
            source,
        })?;
        let index = DeclarationIndex::of(&tree);
        let matches = match_entities(entities, &index)?;
        let outcome = splice_matches(&target.text, &matches)?;

        let mut session = ChangeSession::new(SessionOp::SnippetReplace);
        for name in &outcome.not_found {
            session.warnings.push(format!(
                "{}: no declaration named \"{name}\"",
                self.display_path(&target.path)
            ));
        }
        if outcome.new_text != target.text {
            session.changes.push(self.change(target, outcome.new_text));
        }
        tracing::info!(
            target: "sweep.workspace",
            session = %session.id,
            file = %target.path.display(),
            replaced = outcome.replaced.len(),
            not_found = outcome.not_found.len(),
            "previewed snippet replace"
        );
        Ok(session)
    }

    /// Preview running the external formatter over the scanned files.
    ///
    /// Invocations are independent, so they run in parallel; results
    /// come back in the input's path order. A failing invocation skips
    /// that file, it never aborts the batch.
    pub fn preview_format(&self, files: &[ScannedFile]) -> Result<ChangeSession, WorkspaceError> {
        let results: Vec<Result<String, String>> = files
            .par_iter()
            .map(|file| {
                if let Err(err) = parse(&file.text) {
                    return Err(err.to_string());
                }
                let cleaned = strip_trailing_semicolons(&file.text);
                self.formatter.format(&cleaned).map_err(|err| err.to_string())
            })
            .collect();

        let mut session = ChangeSession::new(SessionOp::Format);
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(new_text) if new_text != file.text => {
                    session.changes.push(self.change(file, new_text));
                }
                Ok(_) => {}
                Err(reason) => session.skipped.push(SkippedFile {
                    path: file.path.clone(),
                    reason,
                }),
            }
        }
        tracing::info!(
            target: "sweep.workspace",
            session = %session.id,
            changed = session.changes.len(),
            skipped = session.skipped.len(),
            "previewed format"
        );
        Ok(session)
    }

    /// Write a pending session to disk and record it for undo.
    ///
    /// Files are written atomically one by one. If a write fails part
    /// way through, the files already written stay written and the undo
    /// record is truncated to exactly that subset before the error is
    /// surfaced, so undo remains truthful.
    pub fn commit(&mut self, session: &mut ChangeSession) -> Result<CommitReport, WorkspaceError> {
        if session.state != SessionState::Pending {
            return Err(WorkspaceError::SessionNotPending {
                id: session.id.clone(),
            });
        }

        let mut written: Vec<FileSnapshot> = Vec::with_capacity(session.changes.len());
        let mut failure: Option<WorkspaceError> = None;
        for change in &session.changes {
            match atomic_write(&change.path, change.new_text.as_bytes()) {
                Ok(()) => written.push(FileSnapshot {
                    path: change.path.clone(),
                    before: change.old_text.clone(),
                    after: change.new_text.clone(),
                }),
                Err(source) => {
                    failure = Some(WorkspaceError::Io {
                        path: change.path.clone(),
                        source,
                    });
                    break;
                }
            }
        }

        let files_written: Vec<PathBuf> = written.iter().map(|f| f.path.clone()).collect();
        if !written.is_empty() {
            self.history.record(UndoRecord {
                session_id: session.id.clone(),
                label: session.op.label().to_string(),
                committed_at_ms: now_ms(),
                files: written,
            })?;
        }

        if let Some(err) = failure {
            tracing::warn!(
                target: "sweep.workspace",
                session = %session.id,
                written = files_written.len(),
                of = session.changes.len(),
                error = %err,
                "commit failed part way through"
            );
            return Err(err);
        }

        session.state = SessionState::Applied;
        tracing::info!(
            target: "sweep.workspace",
            session = %session.id,
            files = files_written.len(),
            "committed session"
        );
        Ok(CommitReport {
            session_id: session.id.clone(),
            files_written,
        })
    }

    /// Revert the most recent committed session. `None` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> Result<Option<HistoryReport>, WorkspaceError> {
        match self.history.undo() {
            Ok(report) => Ok(Some(report)),
            Err(HistoryError::NothingToUndo) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Re-apply the most recently undone session. `None` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> Result<Option<HistoryReport>, WorkspaceError> {
        match self.history.redo() {
            Ok(report) => Ok(Some(report)),
            Err(HistoryError::NothingToRedo) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn change(&self, file: &ScannedFile, new_text: String) -> FileChange {
        let display = self.display_path(&file.path);
        let unified_diff = unified_diff(&display, &file.text, &new_text);
        FileChange {
            path: file.path.clone(),
            old_text: file.text.clone(),
            new_text,
            unified_diff,
        }
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}
