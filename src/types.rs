use serde::{Deserialize, Serialize};

/// One entry of the conversation log.
///
/// Immutable once appended to a history; insertion order is temporal order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Epoch millis, stamped when the message enters the history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Answer mode selector understood by the panel server
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Pro,
    Rapido,
    Presentacion,
}

/// Wire shape of one outgoing conversation turn
#[derive(Debug, Serialize, Clone)]
pub struct OutgoingMessage {
    pub role: MessageRole,
    pub content: String,
}

/// JSON body of the chat endpoint: `{messages, mode}`
#[derive(Debug, Serialize, Clone)]
pub struct ChatRequest {
    pub messages: Vec<OutgoingMessage>,
    pub mode: ChatMode,
}

/// Common error types for panel server requests
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
