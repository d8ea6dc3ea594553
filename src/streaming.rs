//! Chunk sources feeding the stream session
//!
//! The session's read loop is written against a small trait so the same
//! processing drives both live HTTP responses and scripted chunk sequences,
//! keeping behavior identical between production and replay/testing.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Response;
use std::collections::VecDeque;

/// A source of raw body chunks
#[async_trait]
pub trait ChunkStream: Send {
    /// Next chunk of the body, or None at end-of-stream
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Live HTTP response chunk stream
pub struct HttpChunkStream {
    response: Response,
}

impl HttpChunkStream {
    pub fn new(response: Response) -> Self {
        Self { response }
    }
}

#[async_trait]
impl ChunkStream for HttpChunkStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        match self.response.chunk().await {
            Ok(Some(chunk)) => Ok(Some(chunk.to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(anyhow::anyhow!("HTTP chunk error: {}", e)),
        }
    }
}

/// Scripted chunk sequence with deterministic boundaries
pub struct ScriptedChunkStream {
    chunks: VecDeque<Vec<u8>>,
}

impl ScriptedChunkStream {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }
}

#[async_trait]
impl ChunkStream for ScriptedChunkStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.chunks.pop_front())
    }
}
