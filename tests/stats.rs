use std::time::Duration;

use chrono::Utc;
use streambench::record::{RequestRecord, RunStatus};
use streambench::stats::aggregate;

fn ok(sequence: u32, secs: f64) -> RequestRecord {
    RequestRecord::success(sequence, Utc::now(), Duration::from_secs_f64(secs), 10, None)
}

fn fail(sequence: u32) -> RequestRecord {
    RequestRecord::failure(sequence, Utc::now(), Duration::from_millis(300), "HTTP 503: busy")
}

#[test]
fn success_failure_success() {
    let summary = aggregate(&[ok(1, 1.0), fail(2), ok(3, 2.0)]);

    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.availability_pct, 66.7);
    assert_eq!(summary.avg_duration, Some(Duration::from_millis(1500)));
    assert_eq!(summary.min_duration, Some(Duration::from_secs(1)));
    assert_eq!(summary.max_duration, Some(Duration::from_secs(2)));
}

#[test]
fn failure_durations_are_excluded_from_timing() {
    let summary = aggregate(&[fail(1), ok(2, 0.5), fail(3)]);

    assert_eq!(summary.min_duration, Some(Duration::from_millis(500)));
    assert_eq!(summary.max_duration, Some(Duration::from_millis(500)));
    assert_eq!(summary.availability_pct, 33.3);
}

#[test]
fn no_successes_yields_sentinels() {
    let summary = aggregate(&[fail(1), fail(2)]);

    assert_eq!(summary.availability_pct, 0.0);
    assert!(summary.avg_duration.is_none());
    assert!(summary.min_duration.is_none());
    assert!(summary.max_duration.is_none());
}

#[test]
fn empty_record_list() {
    let summary = aggregate(&[]);

    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.failure_count, 0);
    assert_eq!(summary.availability_pct, 0.0);
    assert!(summary.avg_duration.is_none());
}

#[test]
fn counts_always_add_up() {
    let records: Vec<_> = (1..=9)
        .map(|i| if i % 3 == 0 { fail(i) } else { ok(i, i as f64 / 10.0) })
        .collect();
    let summary = aggregate(&records);

    assert_eq!(summary.success_count + summary.failure_count, records.len());
}

#[test]
fn status_classification() {
    assert_eq!(RunStatus::classify(3, 3), RunStatus::Success);
    assert_eq!(RunStatus::classify(0, 3), RunStatus::Failed);
    assert_eq!(RunStatus::classify(2, 3), RunStatus::PartialSuccess);
    assert_eq!(RunStatus::classify(0, 0), RunStatus::Failed);
}

#[test]
fn exit_codes() {
    assert_eq!(RunStatus::Success.exit_code(), 0);
    assert_eq!(RunStatus::PartialSuccess.exit_code(), 0);
    assert_eq!(RunStatus::Failed.exit_code(), 1);
    assert_eq!(RunStatus::RuntimeError.exit_code(), 1);
    assert_eq!(RunStatus::ConfigError.exit_code(), 2);
}
