//! Conversation log and request building
//!
//! An append-only message list plus the answer-mode selector. Messages are
//! never mutated after insertion; display order is insertion order. The
//! caller is expected to serialize sends; a new request is only built
//! while no stream session is active.

use crate::session::StreamSession;
use crate::types::{ChatMessage, ChatMode, ChatRequest, MessageRole, OutgoingMessage};
use chrono::Utc;

/// Number of trailing history messages sent with each request
const HISTORY_WINDOW: usize = 10;

#[derive(Debug, Default)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
    mode: ChatMode,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ChatMode) {
        self.mode = mode;
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Append a user turn stamped with the current time
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Some(Utc::now().timestamp_millis()),
        });
    }

    /// Append an assistant turn stamped with the current time. Used by the
    /// non-streaming fallback path; streamed answers go through
    /// [`finalize_stream`](Self::finalize_stream).
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Some(Utc::now().timestamp_millis()),
        });
    }

    /// Move a finished stream into the log as an assistant message. Blank
    /// accumulations (a run cancelled before any delta arrived) leave the
    /// log untouched.
    pub fn finalize_stream(&mut self, session: &StreamSession) {
        let text = session.accumulated_text();
        if text.trim().is_empty() {
            return;
        }
        self.push(ChatMessage {
            role: MessageRole::Assistant,
            content: text.to_string(),
            timestamp: Some(Utc::now().timestamp_millis()),
        });
    }

    /// Request body for a new user turn: the trailing history window plus
    /// the new message, under the current mode.
    pub fn build_request(&self, user_content: impl Into<String>) -> ChatRequest {
        let tail = self.messages.len().saturating_sub(HISTORY_WINDOW);
        let mut messages: Vec<OutgoingMessage> = self.messages[tail..]
            .iter()
            .map(|m| OutgoingMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();
        messages.push(OutgoingMessage {
            role: MessageRole::User,
            content: user_content.into(),
        });
        ChatRequest {
            messages,
            mode: self.mode,
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
