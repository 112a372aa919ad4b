use chrono::Utc;
use streambench::config::Config;
use streambench::document::{MARKER_END, MARKER_START};
use streambench::error::BenchError;
use streambench::publish::{DEFAULT_DOCUMENT, append_step_summary, publish, update_document};
use streambench::record::{RunResult, RunStatus};

fn block(body: &str) -> String {
    format!("{MARKER_START}\n{body}\n{MARKER_END}\n")
}

#[test]
fn missing_document_is_created_with_heading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("README.md");

    update_document(&path, &block("first")).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(DEFAULT_DOCUMENT.trim_end()));
    assert!(text.ends_with(&block("first")));
}

#[test]
fn repeated_runs_keep_a_single_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("README.md");
    std::fs::write(&path, "# Project\n\nDocs here.\n").unwrap();

    update_document(&path, &block("run 1")).unwrap();
    update_document(&path, &block("run 2")).unwrap();
    update_document(&path, &block("run 2")).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, format!("# Project\n\nDocs here.\n\n{}", block("run 2")));
    assert!(!text.contains("run 1"));
}

#[test]
fn malformed_markers_leave_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("README.md");
    let original = format!("# Project\n{MARKER_START}\ndangling\n");
    std::fs::write(&path, &original).unwrap();

    let err = update_document(&path, &block("new")).unwrap_err();

    assert!(matches!(err, BenchError::DocumentFormat(_)), "{err:?}");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn unwritable_location_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("README.md");

    let err = update_document(&path, &block("x")).unwrap_err();
    assert!(matches!(err, BenchError::Io { .. }), "{err:?}");
}

#[test]
fn step_summary_appends_and_skips_when_unset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.md");

    append_step_summary(None, "ignored").unwrap();
    append_step_summary(Some(&path), "first").unwrap();
    append_step_summary(Some(&path), "second").unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
}

#[test]
fn unusable_document_downgrades_run_to_runtime_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("README.md");
    let summary_path = dir.path().join("summary.md");
    let original = format!("# Project\n{MARKER_START}\nno end marker\n");
    std::fs::write(&path, &original).unwrap();
    let config = Config {
        document_path: path.clone(),
        ..Config::default()
    };

    let result = publish(
        RunResult::runtime_error(3, Utc::now(), "placeholder"),
        &config,
        Some(&summary_path),
    );

    assert_eq!(result.status, RunStatus::RuntimeError);
    assert_eq!(result.status.exit_code(), 1);
    let message = result.error_message.unwrap();
    assert!(message.starts_with("Unexpected runtime error:"), "{message}");
    assert!(message.contains("document format error"), "{message}");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), original);

    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert!(summary.contains("RUNTIME_ERROR"), "{summary}");
}

#[test]
fn config_error_run_is_still_published() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("STATUS.md");
    let config = Config {
        document_path: path.clone(),
        ..Config::default()
    };

    let result = publish(
        RunResult::config_error(5, Utc::now(), "OPENAI_REQUEST_COUNT has an invalid value: five"),
        &config,
        None,
    );

    assert_eq!(result.status, RunStatus::ConfigError);
    assert_eq!(result.status.exit_code(), 2);
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("- Status: **CONFIG_ERROR**"), "{text}");
    assert!(text.contains("OPENAI_REQUEST_COUNT has an invalid value: five"));
    assert_eq!(text.matches(MARKER_START).count(), 1);
}
