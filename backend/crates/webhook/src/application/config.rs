//! Application Configuration
//!
//! Configuration for the webhook delivery application layer.

use std::time::Duration;

use crate::domain::retry::RetryPolicy;

/// Webhook delivery configuration
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub retry: RetryPolicy,
    /// Per-attempt HTTP timeout
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(10),
            user_agent: concat!("ngc5pm-webhooks/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl WebhookConfig {
    /// Short retry schedule for local development
    pub fn development() -> Self {
        Self {
            retry: RetryPolicy::new(3, Duration::from_millis(500), Duration::from_secs(5)),
            request_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
