use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::WorkspaceError;

pub const CONFIG_FILE_NAME: &str = ".sweep.toml";

/// Workspace settings loaded from `.sweep.toml` at the root. A missing
/// file yields the defaults; a malformed file is an error.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Glob patterns selecting the files a scan picks up.
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Directory names pruned from traversal wherever they appear.
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,

    /// Formatter invocation, program first. Text is fed on stdin and
    /// read back from stdout.
    #[serde(default = "default_formatter_command")]
    pub formatter_command: Vec<String>,

    /// Seconds to wait for one formatter invocation.
    #[serde(default = "default_formatter_timeout_secs")]
    pub formatter_timeout_secs: u64,

    /// Where committed sessions are snapshotted, relative to the root
    /// unless absolute.
    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,
}

fn default_include() -> Vec<String> {
    vec!["**/*.py".to_string()]
}

fn default_ignore_dirs() -> Vec<String> {
    [".git", ".sweep", "__pycache__", ".venv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_formatter_command() -> Vec<String> {
    vec!["ruff".to_string(), "format".to_string(), "-".to_string()]
}

fn default_formatter_timeout_secs() -> u64 {
    10
}

fn default_history_dir() -> PathBuf {
    PathBuf::from(".sweep/history")
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            ignore_dirs: default_ignore_dirs(),
            formatter_command: default_formatter_command(),
            formatter_timeout_secs: default_formatter_timeout_secs(),
            history_dir: default_history_dir(),
        }
    }
}

impl WorkspaceConfig {
    pub fn load(root: &Path) -> Result<Self, WorkspaceError> {
        let path = root.join(CONFIG_FILE_NAME);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(WorkspaceError::Io { path, source }),
        };
        toml::from_str(&text).map_err(|source| WorkspaceError::Config { path, source })
    }

    pub fn history_root(&self, root: &Path) -> PathBuf {
        if self.history_dir.is_absolute() {
            self.history_dir.clone()
        } else {
            root.join(&self.history_dir)
        }
    }
}
