use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// The operation a session was previewed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOp {
    TextReplace,
    SnippetReplace,
    Format,
}

impl SessionOp {
    pub fn label(self) -> &'static str {
        match self {
            SessionOp::TextReplace => "text-replace",
            SessionOp::SnippetReplace => "snippet-replace",
            SessionOp::Format => "format",
        }
    }
}

impl fmt::Display for SessionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Pending,
    Applied,
    Discarded,
    Reverted,
}

/// One file's pending rewrite: the text it had when previewed, the
/// text it will have after commit, and a unified diff for display.
#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: PathBuf,
    pub old_text: String,
    pub new_text: String,
    pub unified_diff: String,
}

/// A file the operation selected but could not transform. Skips never
/// abort the session; they ride along so the caller can surface them.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// A previewed batch of rewrites. Nothing on disk changes until the
/// session is committed; discarding it is free.
#[derive(Debug)]
pub struct ChangeSession {
    pub id: String,
    pub op: SessionOp,
    pub changes: Vec<FileChange>,
    pub skipped: Vec<SkippedFile>,
    /// Snippet entities with no target in a file, reported per path.
    pub warnings: Vec<String>,
    pub state: SessionState,
    pub created_at_ms: u64,
}

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

impl ChangeSession {
    pub fn new(op: SessionOp) -> Self {
        let created_at_ms = now_ms();
        let n = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("{}-{created_at_ms}-{n}", op.label()),
            op,
            changes: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
            state: SessionState::Pending,
            created_at_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn discard(&mut self) {
        if self.state == SessionState::Pending {
            self.state = SessionState::Discarded;
        }
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
