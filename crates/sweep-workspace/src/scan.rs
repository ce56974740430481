use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::WorkspaceConfig;
use crate::WorkspaceError;

/// A file picked up by a scan, with its content captured at scan time.
/// Sessions previewed from a scan see this snapshot even if the file
/// changes underneath them.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub text: String,
}

/// A file the scan selected but could not read.
#[derive(Debug)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub error: std::io::Error,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub files: Vec<ScannedFile>,
    pub failures: Vec<ScanFailure>,
}

pub(crate) fn build_include_set(config: &WorkspaceConfig) -> Result<GlobSet, WorkspaceError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in &config.include {
        let glob = Glob::new(pattern).map_err(|source| WorkspaceError::IncludePattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|source| WorkspaceError::IncludePattern {
            pattern: config.include.join(", "),
            source,
        })
}

/// Walk `root` collecting every file whose root-relative path matches
/// an include glob. Ignored directory names are pruned wherever they
/// appear in the tree. Read failures are reported per file, never
/// fatal.
pub(crate) fn scan(root: &Path, config: &WorkspaceConfig) -> Result<ScanReport, WorkspaceError> {
    let include = build_include_set(config)?;
    let mut report = ScanReport::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| config.ignore_dirs.iter().any(|d| d == name)))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                report.failures.push(ScanFailure {
                    path,
                    error: err.into(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if !include.is_match(relative) {
            continue;
        }
        match std::fs::read_to_string(entry.path()) {
            Ok(text) => report.files.push(ScannedFile {
                path: entry.path().to_path_buf(),
                text,
            }),
            Err(error) => report.failures.push(ScanFailure {
                path: entry.path().to_path_buf(),
                error,
            }),
        }
    }

    tracing::debug!(
        target: "sweep.workspace",
        root = %root.display(),
        files = report.files.len(),
        failures = report.failures.len(),
        "scan finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn matches_include_globs_and_prunes_ignored_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("a.py"), "x = 1\n");
        touch(&tmp.path().join("pkg/b.py"), "y = 2\n");
        touch(&tmp.path().join("notes.txt"), "nope\n");
        touch(&tmp.path().join("__pycache__/c.py"), "z = 3\n");
        touch(&tmp.path().join(".git/d.py"), "w = 4\n");

        let report = scan(tmp.path(), &WorkspaceConfig::default()).unwrap();
        let names: Vec<_> = report
            .files
            .iter()
            .map(|f| f.path.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("a.py"), PathBuf::from("pkg/b.py")]);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn bad_include_pattern_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = WorkspaceConfig {
            include: vec!["[".to_string()],
            ..WorkspaceConfig::default()
        };
        assert!(matches!(
            scan(tmp.path(), &config),
            Err(WorkspaceError::IncludePattern { .. })
        ));
    }

    #[test]
    fn scan_captures_file_contents() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("a.py"), "def f():\n    pass\n");
        let report = scan(tmp.path(), &WorkspaceConfig::default()).unwrap();
        assert_eq!(report.files[0].text, "def f():\n    pass\n");
    }
}
