//! Exercises the process sink against real programs.

#![cfg(unix)]

use std::io::Write;
use std::os::unix::fs::PermissionsExt;

use tswio_keystroke::{KeyCombo, KeystrokeError, KeystrokeSink, ProcessKeystrokeSink};
use tswio_test_helpers::must;

fn write_helper(dir: &tempfile::TempDir, log: &std::path::Path) -> std::path::PathBuf {
    let path = dir.path().join("keystroke");
    let mut file = must(std::fs::File::create(&path));
    must(writeln!(file, "#!/bin/sh\necho \"$1 $2\" >> '{}'", log.display()));
    drop(file);
    must(std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)));
    path
}

#[tokio::test]
async fn helper_receives_action_and_canonical_combo() {
    let dir = must(tempfile::tempdir());
    let log = dir.path().join("calls.log");
    let sink = ProcessKeystrokeSink::new(write_helper(&dir, &log));
    let combo = must(KeyCombo::parse("ctrl+shift+s"));

    must(sink.key_down(&combo).await);
    must(sink.key_up(&combo).await);
    must(sink.tap(&combo).await);

    let calls = must(std::fs::read_to_string(&log));
    assert_eq!(
        calls.lines().collect::<Vec<_>>(),
        vec!["down CTRL+SHIFT+S", "up CTRL+SHIFT+S", "tap CTRL+SHIFT+S"]
    );
}

#[tokio::test]
async fn failing_helper_reports_status() {
    let sink = ProcessKeystrokeSink::new("false");
    let combo = must(KeyCombo::parse("A"));
    match sink.tap(&combo).await {
        Err(KeystrokeError::Failed { status, .. }) => assert_eq!(status, 1),
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_helper_reports_spawn_error() {
    let sink = ProcessKeystrokeSink::new("/nonexistent/tswio-keystroke-helper");
    let combo = must(KeyCombo::parse("A"));
    assert!(matches!(
        sink.tap(&combo).await,
        Err(KeystrokeError::Spawn { .. })
    ));
}
