//! External formatter collaborator.
//!
//! The formatter is an opaque pass over one file's text: content in,
//! formatted content out. The default command is `ruff format -`, fed
//! on stdin; any command with the same stdin/stdout contract works.

mod command;
mod preprocess;

pub use command::{CommandFormatter, Formatter};
pub use preprocess::strip_trailing_semicolons;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("formatter command is empty")]
    EmptyCommand,
    #[error("failed to launch formatter `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("formatter failed (exit code {code:?}): {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("formatter timed out after {seconds}s")]
    TimedOut { seconds: u64 },
    #[error("formatter produced non-UTF-8 output")]
    InvalidOutput,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
