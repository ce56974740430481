use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::FormatError;

/// An opaque pass over one file's text.
pub trait Formatter: Send + Sync {
    fn format(&self, text: &str) -> Result<String, FormatError>;
}

/// Formatter backed by an external command reading stdin and writing
/// the formatted text to stdout (the `ruff format -` contract).
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandFormatter {
    pub fn new(command: &[String], timeout: Duration) -> Result<Self, FormatError> {
        let (program, args) = command.split_first().ok_or(FormatError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    pub fn ruff() -> Self {
        Self {
            program: "ruff".to_string(),
            args: vec!["format".to_string(), "-".to_string()],
            timeout: Duration::from_secs(10),
        }
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, text: &str) -> Result<String, FormatError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FormatError::Launch {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin and drain both output pipes on their own threads;
        // writing and reading from one thread can deadlock once a pipe
        // buffer fills.
        let mut stdin = child.stdin.take().ok_or_else(|| {
            FormatError::Io(std::io::Error::other("child stdin unavailable"))
        })?;
        let input = text.to_string();
        let writer = std::thread::spawn(move || {
            let _ = stdin.write_all(input.as_bytes());
        });

        let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
            FormatError::Io(std::io::Error::other("child stdout unavailable"))
        })?;
        let stdout_reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout_pipe.read_to_end(&mut buf);
            buf
        });

        let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
            FormatError::Io(std::io::Error::other("child stderr unavailable"))
        })?;
        let stderr_reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr_pipe.read_to_end(&mut buf);
            buf
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(FormatError::TimedOut {
                            seconds: self.timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(err) => return Err(FormatError::Io(err)),
            }
        };

        let _ = writer.join();
        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr_bytes = stderr_reader.join().unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr_bytes).trim().to_string();

        if !status.success() {
            return Err(FormatError::Failed {
                code: status.code(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            tracing::debug!(
                target: "sweep.format",
                program = %self.program,
                stderr = %stderr,
                "formatter wrote warnings to stderr"
            );
        }

        String::from_utf8(stdout).map_err(|_| FormatError::InvalidOutput)
    }
}
