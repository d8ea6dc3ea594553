//! SSE line framing
//!
//! Turns a chunked byte stream into discrete `data: ` payloads. Chunks
//! arrive at arbitrary boundaries, so a line or a multi-byte UTF-8
//! sequence may be split across reads; the decoder buffers partial input
//! so the emitted payload sequence is independent of chunk placement.

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

/// Incremental decoder for `data: `-framed event streams
#[derive(Debug, Default)]
pub struct FrameDecoder {
    line_buffer: String,
    partial_utf8: Vec<u8>,
    done: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the `[DONE]` sentinel has been seen. All further input is
    /// discarded.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one chunk of raw bytes, returning the payloads of all lines the
    /// chunk completed. Lines without the `data: ` prefix are ignored.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut payloads = Vec::new();
        if self.done {
            return payloads;
        }

        let text = self.decode_utf8(chunk);
        for c in text.chars() {
            if c != '\n' {
                self.line_buffer.push(c);
                continue;
            }
            let line = std::mem::take(&mut self.line_buffer);
            if let Some(payload) = payload_of(&line) {
                if payload == DONE_MARKER {
                    self.done = true;
                    self.partial_utf8.clear();
                    return payloads;
                }
                payloads.push(payload.to_string());
            }
        }
        payloads
    }

    /// Flush a trailing unterminated line at end-of-stream. A stream that
    /// never sent `[DONE]` completes implicitly; this drains what remains.
    pub fn finish(&mut self) -> Option<String> {
        if self.done || self.line_buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.line_buffer);
        match payload_of(&line) {
            Some(payload) if payload == DONE_MARKER => {
                self.done = true;
                None
            }
            Some(payload) => Some(payload.to_string()),
            None => None,
        }
    }

    /// Decode the bytes that form complete UTF-8 sequences, carrying an
    /// incomplete trailing sequence over to the next chunk.
    fn decode_utf8(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.partial_utf8);
        bytes.extend_from_slice(chunk);

        let mut text = String::new();
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    text.push_str(std::str::from_utf8(valid).unwrap());
                    match err.error_len() {
                        // Invalid bytes are replaced, as a lossy text
                        // decoder would.
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Incomplete trailing sequence: keep for next chunk.
                        None => {
                            self.partial_utf8 = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }
}

fn payload_of(line: &str) -> Option<&str> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    line.strip_prefix(DATA_PREFIX)
}
