//! Outbound HTTP transport trait

use http::HeaderMap;
use std::time::Duration;
use thiserror::Error;

/// A signed, ready-to-send POST
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Transport-level failure (no HTTP status received)
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request error: {0}")]
    Other(String),
}

#[trait_variant::make(WebhookTransport: Send)]
pub trait LocalWebhookTransport {
    /// POST the request and return the response status code
    async fn post(&self, request: &OutboundRequest) -> Result<u16, TransportError>;
}
