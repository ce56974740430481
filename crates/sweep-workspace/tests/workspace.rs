use std::path::Path;

use pretty_assertions::assert_eq;
use sweep_format::{FormatError, Formatter};
use sweep_workspace::{SessionState, Workspace, WorkspaceConfig, WorkspaceError};

/// Stand-in for the external formatter command.
enum FakeFormatter {
    /// Appends a marker comment to any text not already carrying it.
    AppendMarker,
    /// Fails for files containing `broken_marker`, formats the rest.
    FailSelectively,
}

impl Formatter for FakeFormatter {
    fn format(&self, text: &str) -> Result<String, FormatError> {
        match self {
            FakeFormatter::AppendMarker => {
                if text.ends_with("# formatted\n") {
                    Ok(text.to_string())
                } else {
                    Ok(format!("{text}# formatted\n"))
                }
            }
            FakeFormatter::FailSelectively => {
                if text.contains("broken_marker") {
                    Err(FormatError::Failed {
                        code: Some(2),
                        stderr: "cannot format".to_string(),
                    })
                } else {
                    FakeFormatter::AppendMarker.format(text)
                }
            }
        }
    }
}

fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn read(root: &Path, name: &str) -> String {
    std::fs::read_to_string(root.join(name)).unwrap()
}

fn open(root: &Path, formatter: FakeFormatter) -> Workspace {
    Workspace::with_formatter(root, WorkspaceConfig::default(), Box::new(formatter)).unwrap()
}

#[test]
fn text_replace_touches_only_matching_files() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "a.py", "old_name = 1\n");
    write(tmp.path(), "b.py", "value = old_name\n");
    write(tmp.path(), "c.py", "unrelated = 3\n");

    let ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let scan = ws.scan().unwrap();
    assert_eq!(scan.files.len(), 3);

    let session = ws
        .preview_text_replace(&scan.files, "old_name", "new_name", false)
        .unwrap();
    assert_eq!(session.changes.len(), 2);
    assert_eq!(session.changes[0].new_text, "new_name = 1\n");
    assert!(session.changes[0].unified_diff.contains("+new_name = 1"));
    // Nothing on disk moves at preview time.
    assert_eq!(read(tmp.path(), "a.py"), "old_name = 1\n");
}

#[test]
fn invalid_regex_is_rejected_before_any_file_is_read() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "a.py", "x = 1\n");

    let ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let scan = ws.scan().unwrap();
    let err = ws
        .preview_text_replace(&scan.files, "(unclosed", "x", true)
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::Regex(_)));
}

#[test]
fn commit_undo_redo_round_trip_is_byte_identical() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "a.py", "old_name = 1\n");

    let mut ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let scan = ws.scan().unwrap();
    let mut session = ws
        .preview_text_replace(&scan.files, "old_name", "new_name", false)
        .unwrap();

    let report = ws.commit(&mut session).unwrap();
    assert_eq!(session.state, SessionState::Applied);
    assert_eq!(report.files_written.len(), 1);
    assert_eq!(read(tmp.path(), "a.py"), "new_name = 1\n");

    let undone = ws.undo().unwrap().unwrap();
    assert_eq!(undone.files.len(), 1);
    assert_eq!(read(tmp.path(), "a.py"), "old_name = 1\n");

    ws.redo().unwrap().unwrap();
    assert_eq!(read(tmp.path(), "a.py"), "new_name = 1\n");

    // Stacks exhausted in both directions are a no-op.
    ws.undo().unwrap().unwrap();
    assert!(ws.undo().unwrap().is_none());
    ws.redo().unwrap().unwrap();
    assert!(ws.redo().unwrap().is_none());
}

#[test]
fn history_survives_reopening_the_workspace() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "a.py", "old_name = 1\n");

    {
        let mut ws = open(tmp.path(), FakeFormatter::AppendMarker);
        let scan = ws.scan().unwrap();
        let mut session = ws
            .preview_text_replace(&scan.files, "old_name", "new_name", false)
            .unwrap();
        ws.commit(&mut session).unwrap();
    }

    let mut reopened = open(tmp.path(), FakeFormatter::AppendMarker);
    reopened.undo().unwrap().unwrap();
    assert_eq!(read(tmp.path(), "a.py"), "old_name = 1\n");
}

#[test]
fn failed_commit_records_only_the_files_actually_written() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "a.py", "old = 1\n");
    write(tmp.path(), "b.py", "old = 2\n");

    let mut ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let scan = ws.scan().unwrap();
    let mut session = ws
        .preview_text_replace(&scan.files, "old", "new", false)
        .unwrap();
    assert_eq!(session.changes.len(), 2);

    // Replace the second target with a directory so its write fails
    // after the first file has already been written.
    std::fs::remove_file(tmp.path().join("b.py")).unwrap();
    std::fs::create_dir(tmp.path().join("b.py")).unwrap();

    let err = ws.commit(&mut session).unwrap_err();
    assert!(matches!(err, WorkspaceError::Io { .. }));
    assert_eq!(read(tmp.path(), "a.py"), "new = 1\n");

    // The undo record covers exactly the committed subset.
    let report = ws.undo().unwrap().unwrap();
    assert_eq!(report.files, vec![tmp.path().join("a.py")]);
    assert_eq!(read(tmp.path(), "a.py"), "old = 1\n");
    assert!(tmp.path().join("b.py").is_dir());
}

#[test]
fn committing_a_session_twice_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "a.py", "old = 1\n");

    let mut ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let scan = ws.scan().unwrap();
    let mut session = ws
        .preview_text_replace(&scan.files, "old", "new", false)
        .unwrap();
    ws.commit(&mut session).unwrap();
    assert!(matches!(
        ws.commit(&mut session),
        Err(WorkspaceError::SessionNotPending { .. })
    ));
}

fn scanned(ws: &Workspace, name: &str) -> sweep_workspace::ScannedFile {
    ws.scan()
        .unwrap()
        .files
        .into_iter()
        .find(|f| f.path.ends_with(name))
        .unwrap()
}

#[test]
fn snippet_replace_swaps_the_named_function_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    write(
        tmp.path(),
        "greeting.py",
        "# header\ndef greet():\n    return \"hi\"\n\ntail = 1\n",
    );

    let mut ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let target = scanned(&ws, "greeting.py");
    let mut session = ws
        .preview_snippet_replace(
            &target,
            "def greet():\n    return \"hello\"\n\ndef missing():\n    pass\n",
            false,
        )
        .unwrap();

    assert_eq!(session.changes.len(), 1);
    ws.commit(&mut session).unwrap();
    assert_eq!(
        read(tmp.path(), "greeting.py"),
        "# header\ndef greet():\n    return \"hello\"\n\ntail = 1\n"
    );
    // Entities with no counterpart are reported, not applied.
    assert!(session.warnings.iter().any(|w| w.contains("missing")));
}

#[test]
fn snippet_replace_touches_only_the_target_file() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "a.py", "def greet():\n    return \"a\"\n");
    write(tmp.path(), "b.py", "def greet():\n    return \"b\"\n");

    let mut ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let target = scanned(&ws, "a.py");
    let mut session = ws
        .preview_snippet_replace(&target, "def greet():\n    return \"new\"\n", false)
        .unwrap();

    // One target file, one change; the same-named declaration elsewhere
    // in the tree is not part of the operation.
    assert_eq!(session.changes.len(), 1);
    assert!(session.changes[0].path.ends_with("a.py"));
    ws.commit(&mut session).unwrap();
    assert_eq!(read(tmp.path(), "a.py"), "def greet():\n    return \"new\"\n");
    assert_eq!(read(tmp.path(), "b.py"), "def greet():\n    return \"b\"\n");
}

#[test]
fn indented_snippet_lands_on_a_method() {
    let tmp = tempfile::tempdir().unwrap();
    write(
        tmp.path(),
        "cls.py",
        "class C:\n    def m(self):\n        return 1\n",
    );

    let mut ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let target = scanned(&ws, "cls.py");
    let mut session = ws
        .preview_snippet_replace(&target, "    def m(self):\n        return 2\n", false)
        .unwrap();
    ws.commit(&mut session).unwrap();
    assert_eq!(
        read(tmp.path(), "cls.py"),
        "class C:\n    def m(self):\n        return 2\n"
    );
}

#[test]
fn ambiguous_target_rejects_the_whole_preview() {
    let tmp = tempfile::tempdir().unwrap();
    write(
        tmp.path(),
        "dup.py",
        "def f():\n    pass\n\ndef f():\n    pass\n",
    );

    let ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let target = scanned(&ws, "dup.py");
    let err = ws
        .preview_snippet_replace(&target, "def f():\n    return 1\n", false)
        .unwrap_err();
    assert!(matches!(
        err,
        WorkspaceError::Snippet(sweep_refactor::SnippetError::AmbiguousTarget { .. })
    ));
}

#[test]
fn unparseable_target_is_rejected_with_its_position() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "broken.py", "def broken(:\n");

    let ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let target = scanned(&ws, "broken.py");
    let err = ws
        .preview_snippet_replace(&target, "def f():\n    return 2\n", false)
        .unwrap_err();
    match err {
        WorkspaceError::TargetParse { path, .. } => assert!(path.ends_with("broken.py")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(read(tmp.path(), "broken.py"), "def broken(:\n");
}

#[test]
fn format_preview_runs_per_file_and_isolates_failures() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "a.py", "x = 1\n");
    write(tmp.path(), "b.py", "broken_marker = 1\n");
    write(tmp.path(), "c.py", "y = 2\n# formatted\n");

    let ws = open(tmp.path(), FakeFormatter::FailSelectively);
    let scan = ws.scan().unwrap();
    let session = ws.preview_format(&scan.files).unwrap();

    // a.py changes, b.py fails, c.py is already formatted.
    assert_eq!(session.changes.len(), 1);
    assert!(session.changes[0].path.ends_with("a.py"));
    assert_eq!(session.changes[0].new_text, "x = 1\n# formatted\n");
    assert_eq!(session.skipped.len(), 1);
    assert!(session.skipped[0].path.ends_with("b.py"));
    assert!(session.skipped[0].reason.contains("cannot format"));
}

#[test]
fn format_preview_strips_trailing_semicolons_first() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "a.py", "x = 1;\n");

    let ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let scan = ws.scan().unwrap();
    let session = ws.preview_format(&scan.files).unwrap();
    assert_eq!(session.changes[0].new_text, "x = 1\n# formatted\n");
}

#[test]
fn format_preview_skips_files_that_do_not_parse() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "broken.py", "def broken(:\n");

    let ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let scan = ws.scan().unwrap();
    let session = ws.preview_format(&scan.files).unwrap();
    assert!(session.changes.is_empty());
    assert_eq!(session.skipped.len(), 1);
}

#[test]
fn replaying_a_replace_after_commit_is_a_no_op() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "a.py", "old = 1\n");

    let mut ws = open(tmp.path(), FakeFormatter::AppendMarker);
    let scan = ws.scan().unwrap();
    let mut session = ws
        .preview_text_replace(&scan.files, "old", "new", false)
        .unwrap();
    ws.commit(&mut session).unwrap();

    // The pattern no longer matches, so a second pass proposes nothing.
    let scan = ws.scan().unwrap();
    let again = ws
        .preview_text_replace(&scan.files, "old", "new", false)
        .unwrap();
    assert!(again.is_empty());
    assert_eq!(read(tmp.path(), "a.py"), "new = 1\n");
}

#[test]
fn new_commit_clears_the_redo_stack() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "a.py", "v = 1\n");

    let mut ws = open(tmp.path(), FakeFormatter::AppendMarker);

    let scan = ws.scan().unwrap();
    let mut first = ws.preview_text_replace(&scan.files, "1", "2", false).unwrap();
    ws.commit(&mut first).unwrap();
    ws.undo().unwrap().unwrap();

    let scan = ws.scan().unwrap();
    let mut second = ws.preview_text_replace(&scan.files, "1", "3", false).unwrap();
    ws.commit(&mut second).unwrap();

    assert!(ws.redo().unwrap().is_none());
    assert_eq!(read(tmp.path(), "a.py"), "v = 3\n");
}
