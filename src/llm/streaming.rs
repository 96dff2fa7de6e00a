// src/llm/streaming.rs
// Translates the Gemini SSE byte stream into per-fragment events.

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// How a translated stream finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Upstream closed the stream normally.
    Complete,
    /// Reading or decoding failed mid-stream.
    Failed(String),
}

/// Events produced by the translator, in upstream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One text fragment from a candidate part.
    Text(String),
    /// Terminal event; nothing follows it.
    Done(StreamOutcome),
}

/// Consumes the upstream response body line by line and yields one
/// `StreamEvent::Text` per candidate text fragment, finishing with a typed
/// terminal event. Dropping the returned stream stops the upstream read and
/// releases the connection.
pub fn translate_stream<S, B, E>(upstream: S) -> impl Stream<Item = StreamEvent>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    stream! {
        futures::pin_mut!(upstream);
        let mut buffer = String::new();
        loop {
            match upstream.next().await {
                Some(Ok(chunk)) => {
                    buffer.push_str(&String::from_utf8_lossy(chunk.as_ref()));
                    while let Some(newline) = buffer.find('\n') {
                        let line: String = buffer.drain(..=newline).collect();
                        for text in fragments_from_line(line.trim()) {
                            yield StreamEvent::Text(text);
                        }
                    }
                }
                Some(Err(e)) => {
                    warn!("upstream read failed mid-stream: {e}");
                    yield StreamEvent::Done(StreamOutcome::Failed(e.to_string()));
                    return;
                }
                None => {
                    // Flush a trailing line that arrived without a newline.
                    for text in fragments_from_line(buffer.trim()) {
                        yield StreamEvent::Text(text);
                    }
                    yield StreamEvent::Done(StreamOutcome::Complete);
                    return;
                }
            }
        }
    }
}

/// Extracts every candidate text fragment carried by a single SSE line.
/// Non-data lines, sentinel payloads and malformed JSON all yield nothing.
fn fragments_from_line(line: &str) -> Vec<String> {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Vec::new();
    };
    let payload = payload.trim();
    if payload.is_empty() || payload == DONE_SENTINEL {
        return Vec::new();
    }

    let event: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            debug!("skipping malformed stream payload: {e}");
            return Vec::new();
        }
    };

    let mut fragments = Vec::new();
    if let Some(candidates) = event.get("candidates").and_then(Value::as_array) {
        for candidate in candidates {
            let parts = candidate
                .get("content")
                .and_then(|content| content.get("parts"))
                .and_then(Value::as_array);
            for part in parts.into_iter().flatten() {
                if let Some(text) = part.get("text").and_then(Value::as_str) {
                    if !text.is_empty() {
                        fragments.push(text.to_string());
                    }
                }
            }
        }
    }
    fragments
}
