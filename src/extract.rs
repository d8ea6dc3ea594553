//! Assistant text extraction from loosely-typed response payloads
//!
//! The panel server has gone through several response shapes; extraction is
//! an ordered list of probes kept compatible with all of them: top-level
//! `content`, `text`, `response`, one level of nesting under `data`, then
//! the `delta` fragment field. The order is load-bearing compatibility
//! behavior, not a style choice.

use serde_json::Value;
use tracing::debug;

/// Probe a parsed payload for assistant text. Returns the first non-empty
/// match, or None when no known field is present.
pub fn extract_text(value: &Value) -> Option<String> {
    probe(value, true).or_else(|| string_field(value, "delta"))
}

fn probe(value: &Value, descend: bool) -> Option<String> {
    if let Value::String(s) = value {
        return (!s.is_empty()).then(|| s.clone());
    }
    for field in ["content", "text", "response"] {
        if let Some(text) = string_field(value, field) {
            return Some(text);
        }
    }
    if descend {
        if let Some(nested) = value.get("data") {
            return probe(nested, false);
        }
    }
    None
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    match value.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Derive the text delta carried by one raw SSE payload.
///
/// Non-JSON payloads are treated as plain text. A payload that parses but
/// carries no recognizable field yields None rather than an error; a
/// malformed payload never aborts the stream.
pub fn delta_from_payload(payload: &str) -> Option<String> {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => {
            let delta = extract_text(&value);
            if delta.is_none() {
                debug!("No text field in stream payload: '{payload}'");
            }
            delta
        }
        Err(_) => {
            if payload.trim().is_empty() {
                None
            } else {
                Some(payload.to_string())
            }
        }
    }
}
