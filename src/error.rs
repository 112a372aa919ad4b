use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("network error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("document format error: {0}")]
    DocumentFormat(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected internal error: {0}")]
    Internal(String),
}

impl BenchError {
    /// Returns true for errors that belong to a single request and are
    /// recorded as a FAILURE instead of aborting the run.
    pub fn is_request_scoped(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::HttpStatus { .. } | Self::Request(_) | Self::Stream(_)
        )
    }

    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Timeout(_) => "timeout",
            Self::HttpStatus { .. } => "http_status",
            Self::Request(_) => "network",
            Self::Stream(_) => "stream",
            Self::DocumentFormat(_) => "document_format",
            Self::Io { .. } => "io",
            Self::Internal(_) => "internal",
        }
    }
}
