//! Chat streaming client for the analytics panel server
//!
//! This crate implements:
//! - Incremental ingestion of `data: `-framed event streams, tolerant of
//!   arbitrary chunk boundaries and terminated by a `[DONE]` sentinel
//! - Field-probing extraction of assistant text from loosely-typed JSON
//!   payloads, kept compatible with every response shape the server has used
//! - A stream session that accumulates deltas and surfaces lifecycle events
//! - Display formatting of assistant text, plus best-effort recognition of
//!   markdown tables, inline metrics, KPI totals and leftover chart art

#[cfg(test)]
mod tests;

mod utils;

pub mod artifacts;
pub mod client;
pub mod extract;
pub mod format;
pub mod history;
pub mod session;
pub mod sse;
pub mod streaming;
pub mod structured;
pub mod types;

pub use artifacts::clean_chart_artifacts;
pub use client::PanelClient;
pub use format::format_for_display;
pub use history::ChatHistory;
pub use session::StreamSession;
pub use sse::FrameDecoder;
pub use structured::{ParsedKpi, ParsedMetric, ParsedTable, StructuredView};
pub use types::*;

use anyhow::Result;

/// Lifecycle events emitted by a [`StreamSession`] while an answer arrives
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// One incremental fragment of assistant text, already appended to the
    /// session accumulator when the event fires
    Delta(String),
    /// Normal completion; emitted exactly once per run
    Done,
    /// Transport-level failure with a human-readable message
    Error(String),
}

/// Callback receiving stream events.
///
/// Returning an error cancels the session: reading stops, no further events
/// are emitted, and the accumulator keeps exactly what has arrived.
pub type StreamCallback = Box<dyn Fn(&StreamEvent) -> Result<()> + Send + Sync>;
