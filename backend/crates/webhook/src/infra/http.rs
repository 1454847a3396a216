//! reqwest Transport
//!
//! Redirects are not followed: a 3xx from the receiver counts as a failed
//! attempt rather than sending the signed body somewhere else.

use reqwest::redirect::Policy;
use std::time::Duration;

use crate::application::config::WebhookConfig;
use crate::domain::transport::{OutboundRequest, TransportError, WebhookTransport};
use crate::error::{WebhookError, WebhookResult};

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> WebhookResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| WebhookError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    pub fn from_config(config: &WebhookConfig) -> WebhookResult<Self> {
        Self::new(config.request_timeout)
    }
}

impl WebhookTransport for ReqwestTransport {
    async fn post(&self, request: &OutboundRequest) -> Result<u16, TransportError> {
        let response = self
            .client
            .post(&request.url)
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| classify(e, self.timeout))?;

        Ok(response.status().as_u16())
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
