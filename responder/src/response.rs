//! Pre-rendered HTTP/1.1 response
//!
//! The responder answers every connection with the same bytes, so the whole
//! response (status line, headers, body) is rendered once at startup and then
//! shared by every connection task.

use crate::error::Result;
use bytes::Bytes;
use sampreset_shared::SamplingStrategyResponse;

/// Complete response bytes for a strategy document
#[derive(Debug, Clone)]
pub struct RenderedResponse {
    bytes: Bytes,
    body_offset: usize,
}

impl RenderedResponse {
    /// Render `200 OK` with a JSON body for `strategy`
    pub fn from_strategy(strategy: &SamplingStrategyResponse) -> Result<Self> {
        let body = strategy.to_json()?;
        let head = format!(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n",
            body.len()
        );

        let mut buf = Vec::with_capacity(head.len() + body.len());
        buf.extend_from_slice(head.as_bytes());
        buf.extend_from_slice(body.as_bytes());

        Ok(Self {
            bytes: Bytes::from(buf),
            body_offset: head.len(),
        })
    }

    /// Response for the default reset strategy
    pub fn reset_default() -> Result<Self> {
        Self::from_strategy(&SamplingStrategyResponse::reset_default())
    }

    /// Full response bytes; cloning is a reference count bump
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// JSON body only
    pub fn body(&self) -> &[u8] {
        &self.bytes[self.body_offset..]
    }
}
