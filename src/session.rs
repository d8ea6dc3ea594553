//! Stream session driving one chat exchange
//!
//! One session owns the accumulating assistant text for one send. The read
//! loop is single-consumer: decode, extract, accumulate and emit happen
//! synchronously between chunk reads, so deltas reach the caller in read
//! order and the accumulated text only ever grows by appends.

use crate::client::PanelClient;
use crate::extract;
use crate::sse::FrameDecoder;
use crate::streaming::{ChunkStream, HttpChunkStream};
use crate::types::{ApiError, ChatRequest};
use crate::{StreamCallback, StreamEvent};
use anyhow::Result;
use tracing::{debug, warn};

#[derive(Debug, PartialEq)]
pub(crate) enum Outcome {
    Completed,
    Cancelled,
}

/// State of one streamed assistant answer
#[derive(Debug, Default)]
pub struct StreamSession {
    accumulated: String,
    active: bool,
}

impl StreamSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full assistant text received so far in the current run
    pub fn accumulated_text(&self) -> &str {
        &self.accumulated
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Send one chat request and stream the answer.
    ///
    /// Emits `Delta` for every text fragment in arrival order, then exactly
    /// one `Done` on completion, whether the stream ended with `[DONE]`,
    /// ran out naturally, or the server answered with a plain JSON document.
    /// Transport failures emit one `Error` and leave already-received text
    /// in the accumulator, with a visible error annotation appended. The
    /// callback returning an error cancels the run silently.
    ///
    /// The exclusive borrow serializes runs per session; the caller must
    /// not start a new send while one is active.
    pub async fn run(
        &mut self,
        client: &PanelClient,
        request: &ChatRequest,
        on_event: &StreamCallback,
    ) {
        self.accumulated.clear();
        self.active = true;

        let outcome = self.exchange(client, request, on_event).await;
        self.active = false;

        match outcome {
            Ok(Outcome::Completed) => {
                let _ = on_event(&StreamEvent::Done);
            }
            Ok(Outcome::Cancelled) => {
                debug!("Stream session cancelled by caller");
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Chat stream failed: {message}");
                self.accumulated
                    .push_str(&format!("\n\n❌ Error: {message}"));
                let _ = on_event(&StreamEvent::Error(message));
            }
        }
    }

    async fn exchange(
        &mut self,
        client: &PanelClient,
        request: &ChatRequest,
        on_event: &StreamCallback,
    ) -> Result<Outcome> {
        let response = client.post_chat(request).await?;

        let is_event_stream = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("text/event-stream"))
            .unwrap_or(false);

        if is_event_stream {
            let mut stream = HttpChunkStream::new(response);
            return self.consume(&mut stream, on_event).await;
        }

        // Non-streaming fallback: the whole body is one JSON document. When
        // no known field matches, the serialized document itself is shown.
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ApiError::Unknown(format!("Failed to parse response: {e}")))?;
        let delta = extract::extract_text(&value).unwrap_or_else(|| value.to_string());
        if self.emit_delta(delta, on_event).is_err() {
            return Ok(Outcome::Cancelled);
        }
        Ok(Outcome::Completed)
    }

    /// Read loop shared by live responses and scripted streams
    pub(crate) async fn consume(
        &mut self,
        stream: &mut dyn ChunkStream,
        on_event: &StreamCallback,
    ) -> Result<Outcome> {
        let mut decoder = FrameDecoder::new();

        while let Some(chunk) = stream.next_chunk().await? {
            for payload in decoder.push_chunk(&chunk) {
                debug!("Received stream payload: '{payload}'");
                if let Some(delta) = extract::delta_from_payload(&payload) {
                    if self.emit_delta(delta, on_event).is_err() {
                        return Ok(Outcome::Cancelled);
                    }
                }
            }
            if decoder.is_done() {
                return Ok(Outcome::Completed);
            }
        }

        // Stream ended without [DONE]: implicit completion. Drain a trailing
        // unterminated line first.
        if let Some(payload) = decoder.finish() {
            if let Some(delta) = extract::delta_from_payload(&payload) {
                if self.emit_delta(delta, on_event).is_err() {
                    return Ok(Outcome::Cancelled);
                }
            }
        }
        Ok(Outcome::Completed)
    }

    fn emit_delta(&mut self, delta: String, on_event: &StreamCallback) -> Result<()> {
        self.accumulated.push_str(&delta);
        on_event(&StreamEvent::Delta(delta))
    }
}
