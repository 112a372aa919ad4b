use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tokio::time::Instant;

use crate::config::Config;
use crate::dispatch::{Executor, NoProgress, ProgressSink, sse};
use crate::error::BenchError;
use crate::record::RequestRecord;

/// Error bodies are truncated to this many bytes before landing in a record.
const MAX_ERROR_BODY_BYTES: usize = 2 * 1024;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatRequest<'a> {
    fn from_config(config: &'a Config) -> Self {
        Self {
            model: &config.model,
            stream: true,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &config.prompt,
                },
            ],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Streams chat completions over HTTP and classifies each call.
pub struct HttpExecutor {
    client: Client,
    progress: Box<dyn ProgressSink>,
}

impl HttpExecutor {
    pub fn new() -> Result<Self, BenchError> {
        Self::with_progress(Box::new(NoProgress))
    }

    pub fn with_progress(progress: Box<dyn ProgressSink>) -> Result<Self, BenchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| BenchError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, progress })
    }

    async fn stream_once(
        &self,
        config: &Config,
        sequence: u32,
    ) -> Result<sse::StreamOutcome, BenchError> {
        let response = self
            .client
            .post(&config.api_url)
            .header("Authorization", format!("Bearer {}", config.api_key))
            .header("Content-Type", "application/json")
            .json(&ChatRequest::from_config(config))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_bytes = response.bytes().await.unwrap_or_default();
            let truncated = &error_bytes[..error_bytes.len().min(MAX_ERROR_BODY_BYTES)];
            return Err(BenchError::HttpStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(truncated).trim().to_string(),
            });
        }

        sse::consume(response.bytes_stream(), sequence, self.progress.as_ref()).await
    }
}

impl Executor for HttpExecutor {
    async fn execute(&self, config: &Config, sequence: u32) -> RequestRecord {
        self.progress.on_start(sequence, config.request_count);

        let started_at = Utc::now();
        let start = Instant::now();

        // Dropping the in-flight future on expiry closes the connection.
        let outcome = tokio::time::timeout(config.request_timeout, self.stream_once(config, sequence))
            .await
            .unwrap_or_else(|_| {
                Err(BenchError::Timeout(
                    config.request_timeout.as_millis() as u64,
                ))
            });
        let duration = start.elapsed();

        let record = match outcome {
            Ok(stream) => {
                tracing::info!(
                    sequence,
                    elapsed_ms = duration.as_millis() as u64,
                    chars = stream.char_count(),
                    "request succeeded"
                );
                RequestRecord::success(
                    sequence,
                    started_at,
                    duration,
                    stream.char_count(),
                    stream.warning_message(),
                )
            }
            Err(e) => {
                debug_assert!(e.is_request_scoped(), "unexpected error class: {e}");
                tracing::warn!(
                    sequence,
                    elapsed_ms = duration.as_millis() as u64,
                    kind = e.kind(),
                    error = %e,
                    "request failed"
                );
                RequestRecord::failure(sequence, started_at, duration, e.to_string())
            }
        };

        self.progress.on_finish(&record);
        record
    }
}
