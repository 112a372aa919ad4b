use std::fmt::Display;
use std::pin::pin;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use serde_json::Value;

use crate::dispatch::ProgressSink;
use crate::error::BenchError;

/// Terminal payload of an OpenAI-style stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Text gathered from one stream plus any non-fatal problems seen on the way.
#[derive(Debug, Default)]
pub struct StreamOutcome {
    pub text: String,
    pub warnings: Vec<String>,
    /// True once the terminal sentinel was seen.
    pub terminated: bool,
}

impl StreamOutcome {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Warnings folded into a single message, if any.
    pub fn warning_message(&self) -> Option<String> {
        (!self.warnings.is_empty()).then(|| self.warnings.join("; "))
    }
}

/// Consume a server-sent-event byte stream until the terminal sentinel or EOF.
///
/// Events with an empty data field are ignored. Payloads that are not valid
/// JSON are skipped and recorded as warnings. Valid JSON without a string at
/// `choices[0].delta.content` contributes nothing. Transport errors fail the
/// whole stream.
pub async fn consume<S, B, E>(
    bytes: S,
    sequence: u32,
    progress: &dyn ProgressSink,
) -> Result<StreamOutcome, BenchError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut events = pin!(bytes.eventsource());
    let mut outcome = StreamOutcome::default();

    while let Some(event) = events.next().await {
        let event = event.map_err(|e| BenchError::Stream(e.to_string()))?;
        let data = event.data.trim();
        if data.is_empty() {
            continue;
        }
        if data == DONE_SENTINEL {
            outcome.terminated = true;
            break;
        }

        let payload: Value = match serde_json::from_str(data) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(sequence, error = %e, "skipping malformed stream payload");
                outcome
                    .warnings
                    .push(format!("skipped malformed stream payload: {e}"));
                continue;
            }
        };

        let fragment = payload["choices"][0]["delta"]["content"].as_str();
        if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
            progress.on_fragment(sequence, fragment);
            outcome.text.push_str(fragment);
        }
    }

    if !outcome.terminated {
        tracing::warn!(sequence, "stream closed without {DONE_SENTINEL}");
        outcome
            .warnings
            .push(format!("stream closed without {DONE_SENTINEL}"));
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::NoProgress;
    use futures_util::stream;

    type Chunks = stream::Iter<std::vec::IntoIter<Result<&'static [u8], std::io::Error>>>;

    fn chunks(parts: &[&'static str]) -> Chunks {
        stream::iter(parts.iter().copied().map(|p| Ok(p.as_bytes())).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn event_split_across_chunks_is_reassembled() {
        let body = chunks(&[
            "data: {\"choices\":[{\"delta\":",
            "{\"content\":\"abc\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]);
        let out = consume(body, 1, &NoProgress).await.unwrap();
        assert_eq!(out.text, "abc");
        assert!(out.terminated);
        assert!(out.warnings.is_empty());
    }

    #[tokio::test]
    async fn comments_and_named_events_without_data_are_ignored() {
        let body = chunks(&[
            ": keep-alive\n\n",
            "event: ping\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]);
        let out = consume(body, 1, &NoProgress).await.unwrap();
        assert_eq!(out.text, "x");
        assert!(out.warning_message().is_none());
    }

    #[tokio::test]
    async fn role_only_and_empty_choices_contribute_nothing() {
        let body = chunks(&[
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[]}\n\n",
            "data: [DONE]\n\n",
        ]);
        let out = consume(body, 1, &NoProgress).await.unwrap();
        assert_eq!(out.text, "");
        assert_eq!(out.char_count(), 0);
    }

    #[tokio::test]
    async fn unexpected_shapes_are_not_malformed() {
        let body = chunks(&[
            "data: {\"choices\":[{\"delta\":{\"content\":123}}]}\n\n",
            "data: {\"choices\":null}\n\n",
            "data: {\"choices\":[{\"delta\":null}]}\n\n",
            "data: [1,2]\n\n",
            "data: [DONE]\n\n",
        ]);
        let out = consume(body, 1, &NoProgress).await.unwrap();
        assert_eq!(out.text, "");
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    }

    #[tokio::test]
    async fn invalid_json_is_skipped_with_warning() {
        let body = chunks(&[
            "data: {not json\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]);
        let out = consume(body, 1, &NoProgress).await.unwrap();
        assert_eq!(out.text, "ok");
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].starts_with("skipped malformed stream payload"));
    }

    #[tokio::test]
    async fn char_count_counts_characters_not_bytes() {
        let body = chunks(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"服务可用\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]);
        let out = consume(body, 1, &NoProgress).await.unwrap();
        assert_eq!(out.char_count(), 4);
    }
}
