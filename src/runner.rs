use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt;
use tokio::time::Instant;

use crate::config::Config;
use crate::dispatch::Executor;
use crate::record::{RequestRecord, RunResult, RunStatus};
use crate::stats;

/// Loop states. The budget is only consulted on the way from one
/// iteration to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running { next: u32 },
    BudgetExceeded,
    Done,
    Aborted,
}

/// Drives requests strictly one after another. At most one request is in
/// flight at any time.
pub struct Runner<E> {
    executor: E,
}

impl<E: Executor> Runner<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub async fn run(&self, config: &Config) -> RunResult {
        let started_at = Utc::now();

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "configuration rejected, no requests attempted");
            return RunResult::config_error(config.request_count, started_at, e.to_string());
        }

        tracing::info!(
            api_url = %config.api_url,
            model = %config.model,
            planned = config.request_count,
            timeout_ms = config.request_timeout.as_millis() as u64,
            max_runtime_ms = config.max_runtime.as_millis() as u64,
            pause_ms = config.request_pause.as_millis() as u64,
            "starting sequential benchmark"
        );

        let budget = config.runtime_budget();
        let clock = Instant::now();
        let mut records: Vec<RequestRecord> = Vec::new();
        let mut fault: Option<String> = None;
        let mut state = RunState::Pending;

        loop {
            state = match state {
                RunState::Pending => RunState::Running { next: 1 },
                RunState::Running { next } if next > config.request_count => RunState::Done,
                RunState::Running { next } => {
                    let elapsed = clock.elapsed();
                    if next > 1 && budget.is_some_and(|b| elapsed >= b) {
                        tracing::warn!(
                            elapsed_ms = elapsed.as_millis() as u64,
                            stopped_at = next,
                            "max runtime reached, skipping remaining requests"
                        );
                        RunState::BudgetExceeded
                    } else {
                        match self.attempt(config, next).await {
                            Ok(record) => {
                                records.push(record);
                                if next < config.request_count {
                                    pause(config.request_pause).await;
                                }
                                advance(next)
                            }
                            Err(message) => {
                                tracing::error!(sequence = next, error = %message, "aborting run");
                                fault = Some(message);
                                RunState::Aborted
                            }
                        }
                    }
                }
                RunState::BudgetExceeded | RunState::Done | RunState::Aborted => break,
            };
        }

        let total_duration = clock.elapsed();
        let finished_at = Utc::now();
        let summary = stats::aggregate(&records);

        let (status, error_message) = match fault {
            Some(message) => (RunStatus::RuntimeError, Some(message)),
            None => {
                let status = RunStatus::classify(summary.success_count, records.len());
                let message = match status {
                    RunStatus::Failed if records.is_empty() => Some("No request attempted.".to_string()),
                    RunStatus::Failed => Some("All requests failed.".to_string()),
                    _ => None,
                };
                (status, message)
            }
        };

        tracing::info!(
            final_state = ?state,
            status = %status,
            attempted = records.len(),
            succeeded = summary.success_count,
            failed = summary.failure_count,
            availability_pct = summary.availability_pct,
            total_ms = total_duration.as_millis() as u64,
            "benchmark finished"
        );

        RunResult {
            status,
            planned_count: config.request_count,
            summary,
            total_duration,
            started_at,
            finished_at,
            records,
            error_message,
        }
    }

    /// Run one request. A panic inside the executor escapes per-request
    /// containment and is reported as a fault.
    async fn attempt(&self, config: &Config, sequence: u32) -> Result<RequestRecord, String> {
        let record = AssertUnwindSafe(self.executor.execute(config, sequence))
            .catch_unwind()
            .await
            .map_err(|panic| {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                format!("Unexpected runtime error: executor panicked on request {sequence}: {detail}")
            })?;

        if record.sequence != sequence {
            return Err(format!(
                "Unexpected runtime error: executor returned record {} for request {sequence}",
                record.sequence
            ));
        }
        Ok(record)
    }
}

/// Step past `current`. The last representable sequence finishes the run.
fn advance(current: u32) -> RunState {
    match current.checked_add(1) {
        Some(next) => RunState::Running { next },
        None => RunState::Done,
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
