//! HTTP client for the panel server
//!
//! Explicitly constructed and passed by reference, never an ambient
//! global. The
//! lifetime is the value's lifetime: construct, `configure` to point at a
//! different deployment, drop to dispose.

use crate::extract;
use crate::types::{ApiError, ChatRequest};
use crate::utils;
use anyhow::Result;
use reqwest::{Client, Response};
use tracing::debug;

pub struct PanelClient {
    http: Client,
    base_url: String,
}

impl PanelClient {
    pub fn default_base_url() -> String {
        "http://localhost:5000".to_string()
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: normalize_base_url(base_url.into()),
        }
    }

    /// Point the client at a different deployment
    pub fn configure(&mut self, base_url: impl Into<String>) {
        self.base_url = normalize_base_url(base_url.into());
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    /// POST the chat request. Non-2xx statuses come back as `ApiError`;
    /// the caller decides whether the response body is a stream or a
    /// document.
    pub(crate) async fn post_chat(&self, request: &ChatRequest) -> Result<Response> {
        debug!("Sending chat request to {}", self.chat_url());
        let response = self
            .http
            .post(self.chat_url())
            .header("X-Client", "mobile")
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        utils::check_response_error(response).await
    }

    /// Non-streaming fallback: request-response chat against the same
    /// endpoint, extracting the answer with the shared field probing.
    /// Returns an empty string when no known field is present.
    pub async fn send_chat(&self, request: &ChatRequest) -> Result<String> {
        let response = self.post_chat(request).await?;
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ApiError::Unknown(format!("Failed to parse response: {e}")))?;
        Ok(extract::extract_text(&value).unwrap_or_default())
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
