use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::stats::Summary;

/// Outcome of a single streaming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Success,
    Failure,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }
}

/// One finalized request. Records are only ever built once the request has
/// completed or failed, so the duration is always known.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub sequence: u32,
    pub status: RequestStatus,
    pub duration: Duration,
    pub output_chars: usize,
    /// Set for failures, and for successes that logged non-fatal warnings.
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl RequestRecord {
    pub fn success(
        sequence: u32,
        started_at: DateTime<Utc>,
        duration: Duration,
        output_chars: usize,
        warning: Option<String>,
    ) -> Self {
        Self {
            sequence,
            status: RequestStatus::Success,
            duration,
            output_chars,
            error_message: warning,
            started_at,
        }
    }

    pub fn failure(
        sequence: u32,
        started_at: DateTime<Utc>,
        duration: Duration,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            sequence,
            status: RequestStatus::Failure,
            duration,
            output_chars: 0,
            error_message: Some(error_message.into()),
            started_at,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RequestStatus::Success
    }
}

/// Overall verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    PartialSuccess,
    Failed,
    ConfigError,
    RuntimeError,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::PartialSuccess => "PARTIAL_SUCCESS",
            Self::Failed => "FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::RuntimeError => "RUNTIME_ERROR",
        }
    }

    /// Classify a completed loop by its success tally.
    pub fn classify(success_count: usize, actual_count: usize) -> Self {
        if actual_count == 0 || success_count == 0 {
            Self::Failed
        } else if success_count == actual_count {
            Self::Success
        } else {
            Self::PartialSuccess
        }
    }

    /// Process exit code reported to the scheduler.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Success | Self::PartialSuccess => 0,
            Self::ConfigError => 2,
            Self::Failed | Self::RuntimeError => 1,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the renderer needs about one run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub status: RunStatus,
    pub planned_count: u32,
    pub summary: Summary,
    pub total_duration: Duration,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub records: Vec<RequestRecord>,
    /// Run-level error, e.g. the configuration problem or the aborting fault.
    pub error_message: Option<String>,
}

impl RunResult {
    pub fn actual_count(&self) -> usize {
        self.records.len()
    }

    /// A run that never started because configuration was rejected.
    pub fn config_error(planned_count: u32, at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self::not_started(RunStatus::ConfigError, planned_count, at, message.into())
    }

    /// A run that could not be set up, e.g. the HTTP client failed to build.
    pub fn runtime_error(planned_count: u32, at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self::not_started(RunStatus::RuntimeError, planned_count, at, message.into())
    }

    fn not_started(status: RunStatus, planned_count: u32, at: DateTime<Utc>, message: String) -> Self {
        Self {
            status,
            planned_count,
            summary: Summary::default(),
            total_duration: Duration::ZERO,
            started_at: at,
            finished_at: at,
            records: Vec::new(),
            error_message: Some(message),
        }
    }

    /// Downgrade to RUNTIME_ERROR after a fault outside per-request handling,
    /// keeping the records gathered so far.
    pub fn into_runtime_error(self, message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::RuntimeError,
            error_message: Some(message.into()),
            ..self
        }
    }
}
