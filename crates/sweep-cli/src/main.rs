use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sweep_workspace::{ChangeSession, HistoryReport, ScannedFile, Workspace};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sweep", version, about = "Bulk source editing: replace, splice, format, undo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the files a workspace scan picks up
    Scan(ScanArgs),
    /// Find/replace text across the workspace
    Replace(ReplaceArgs),
    /// Replace whole functions or classes from a pasted snippet
    Snippet(SnippetArgs),
    /// Run the configured formatter over the workspace
    Format(FormatArgs),
    /// Replace text, then format the workspace
    Run(RunArgs),
    /// Revert the most recent committed session
    Undo(HistoryArgs),
    /// Re-apply the most recently undone session
    Redo(HistoryArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Workspace root (defaults to current directory)
    #[arg(long, default_value = ".")]
    path: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ReplaceArgs {
    /// Text or regex to search for
    pattern: String,
    /// Replacement text (`$1`-style captures in regex mode)
    replacement: String,
    /// Treat the pattern as a regular expression
    #[arg(long)]
    regex: bool,
    /// Write the changes instead of previewing them
    #[arg(long)]
    apply: bool,
    /// Workspace root (defaults to current directory)
    #[arg(long, default_value = ".")]
    path: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SnippetArgs {
    /// File holding the replacement snippet, or `-` for stdin
    snippet: PathBuf,
    /// File whose matching declarations get replaced
    target: PathBuf,
    /// Run the configured formatter over the snippet before matching
    #[arg(long)]
    format_snippet: bool,
    /// Write the changes instead of previewing them
    #[arg(long)]
    apply: bool,
    /// Workspace root (defaults to current directory)
    #[arg(long, default_value = ".")]
    path: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct FormatArgs {
    /// Write the changes instead of previewing them
    #[arg(long)]
    apply: bool,
    /// Workspace root (defaults to current directory)
    #[arg(long, default_value = ".")]
    path: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RunArgs {
    /// Text or regex to search for
    pattern: String,
    /// Replacement text (`$1`-style captures in regex mode)
    replacement: String,
    /// Treat the pattern as a regular expression
    #[arg(long)]
    regex: bool,
    /// Write the changes instead of previewing them
    #[arg(long)]
    apply: bool,
    /// Workspace root (defaults to current directory)
    #[arg(long, default_value = ".")]
    path: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct HistoryArgs {
    /// Workspace root (defaults to current directory)
    #[arg(long, default_value = ".")]
    path: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Scan(args) => {
            let ws = Workspace::open(&args.path)?;
            let report = ws.scan()?;
            if args.json {
                let envelope = ScanEnvelope {
                    files: report.files.iter().map(|f| f.path.clone()).collect(),
                    failures: report
                        .failures
                        .iter()
                        .map(|f| format!("{}: {}", f.path.display(), f.error))
                        .collect(),
                };
                print_json(&envelope)?;
            } else {
                for file in &report.files {
                    println!("{}", file.path.display());
                }
                for failure in &report.failures {
                    eprintln!("warning: {}: {}", failure.path.display(), failure.error);
                }
                println!(
                    "scanned: {} files, {} unreadable",
                    report.files.len(),
                    report.failures.len()
                );
            }
            Ok(0)
        }
        Command::Replace(args) => {
            let mut ws = Workspace::open(&args.path)?;
            let files = scan_files(&ws)?;
            let session =
                ws.preview_text_replace(&files, &args.pattern, &args.replacement, args.regex)?;
            finish_session(&mut ws, session, args.apply, args.json)
        }
        Command::Snippet(args) => {
            let snippet = read_snippet(&args.snippet)?;
            let mut ws = Workspace::open(&args.path)?;
            let text = std::fs::read_to_string(&args.target)
                .with_context(|| format!("reading {}", args.target.display()))?;
            let target = ScannedFile {
                path: args.target.clone(),
                text,
            };
            let session = ws.preview_snippet_replace(&target, &snippet, args.format_snippet)?;
            finish_session(&mut ws, session, args.apply, args.json)
        }
        Command::Format(args) => {
            let mut ws = Workspace::open(&args.path)?;
            let files = scan_files(&ws)?;
            let session = ws.preview_format(&files)?;
            finish_session(&mut ws, session, args.apply, args.json)
        }
        Command::Run(args) => {
            let mut ws = Workspace::open(&args.path)?;

            let files = scan_files(&ws)?;
            let replace =
                ws.preview_text_replace(&files, &args.pattern, &args.replacement, args.regex)?;
            let replaced = finish_session(&mut ws, replace, args.apply, args.json)?;

            // Re-scan so an applied replace is formatted in its
            // committed form.
            let files = scan_files(&ws)?;
            let format = ws.preview_format(&files)?;
            let formatted = finish_session(&mut ws, format, args.apply, args.json)?;
            Ok(replaced.min(formatted))
        }
        Command::Undo(args) => {
            let mut ws = Workspace::open(&args.path)?;
            let report = ws.undo()?;
            print_history("undo", report, args.json)
        }
        Command::Redo(args) => {
            let mut ws = Workspace::open(&args.path)?;
            let report = ws.redo()?;
            print_history("redo", report, args.json)
        }
    }
}

fn scan_files(ws: &Workspace) -> Result<Vec<ScannedFile>> {
    let report = ws.scan()?;
    for failure in &report.failures {
        eprintln!("warning: {}: {}", failure.path.display(), failure.error);
    }
    Ok(report.files)
}

fn read_snippet(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading snippet from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading snippet from {}", path.display()))
    }
}

/// Print the session, then commit it when `--apply` was passed.
/// Exit code 1 flags "nothing matched" so scripts can tell an empty
/// preview from an applied one.
fn finish_session(
    ws: &mut Workspace,
    mut session: ChangeSession,
    apply: bool,
    json: bool,
) -> Result<i32> {
    let committed = if apply && !session.is_empty() {
        Some(ws.commit(&mut session)?)
    } else {
        None
    };

    if json {
        let envelope = SessionEnvelope {
            id: &session.id,
            op: session.op.label(),
            applied: committed.is_some(),
            changes: session
                .changes
                .iter()
                .map(|c| ChangeEnvelope {
                    path: &c.path,
                    diff: &c.unified_diff,
                })
                .collect(),
            skipped: session
                .skipped
                .iter()
                .map(|s| format!("{}: {}", s.path.display(), s.reason))
                .collect(),
            warnings: &session.warnings,
        };
        print_json(&envelope)?;
    } else {
        for change in &session.changes {
            print!("{}", change.unified_diff);
        }
        for skipped in &session.skipped {
            eprintln!("skipped: {}: {}", skipped.path.display(), skipped.reason);
        }
        for warning in &session.warnings {
            eprintln!("warning: {warning}");
        }
        match &committed {
            Some(report) => println!(
                "applied: {} files ({})",
                report.files_written.len(),
                session.op
            ),
            None => println!(
                "preview: {} files would change ({}); pass --apply to write",
                session.changes.len(),
                session.op
            ),
        }
    }

    Ok(if session.is_empty() { 1 } else { 0 })
}

fn print_history(verb: &str, report: Option<HistoryReport>, json: bool) -> Result<i32> {
    match report {
        Some(report) => {
            if json {
                let envelope = HistoryEnvelope {
                    session_id: &report.session_id,
                    label: &report.label,
                    files: &report.files,
                };
                print_json(&envelope)?;
            } else {
                for file in &report.files {
                    println!("{}", file.display());
                }
                println!(
                    "{verb}: {} ({} files restored)",
                    report.session_id,
                    report.files.len()
                );
            }
            Ok(0)
        }
        None => {
            if json {
                print_json(&serde_json::json!({ "restored": false }))?;
            } else {
                println!("{verb}: nothing to {verb}");
            }
            Ok(1)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

#[derive(Serialize)]
struct ScanEnvelope {
    files: Vec<PathBuf>,
    failures: Vec<String>,
}

#[derive(Serialize)]
struct SessionEnvelope<'a> {
    id: &'a str,
    op: &'a str,
    applied: bool,
    changes: Vec<ChangeEnvelope<'a>>,
    skipped: Vec<String>,
    warnings: &'a [String],
}

#[derive(Serialize)]
struct ChangeEnvelope<'a> {
    path: &'a Path,
    diff: &'a str,
}

#[derive(Serialize)]
struct HistoryEnvelope<'a> {
    session_id: &'a str,
    label: &'a str,
    files: &'a [PathBuf],
}
