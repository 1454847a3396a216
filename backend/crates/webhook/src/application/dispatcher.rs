//! Webhook Dispatcher
//!
//! Signs an envelope once, then POSTs the same bytes until the receiver
//! answers 2xx or the retry policy gives up. Backoff sleeps are awaited
//! inline, so callers run this on a background task.

use chrono::Utc;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::sync::Arc;

use crate::application::config::WebhookConfig;
use crate::domain::entities::{
    DeliveryAttempt, DeliveryOutcome, WebhookEnvelope, WebhookRecord, is_valid_event_name,
};
use crate::domain::signature::sign_body;
use crate::domain::transport::{OutboundRequest, TransportError, WebhookTransport};
use crate::error::{WebhookError, WebhookResult};

pub const X_WEBHOOK_EVENT: HeaderName = HeaderName::from_static("x-webhook-event");
pub const X_WEBHOOK_ID: HeaderName = HeaderName::from_static("x-webhook-id");
pub const X_WEBHOOK_TIMESTAMP: HeaderName = HeaderName::from_static("x-webhook-timestamp");
pub const X_WEBHOOK_SIGNATURE: HeaderName = HeaderName::from_static("x-webhook-signature");

pub struct WebhookDispatcher<T>
where
    T: WebhookTransport + Send + Sync + 'static,
{
    transport: Arc<T>,
    config: Arc<WebhookConfig>,
}

impl<T> Clone for WebhookDispatcher<T>
where
    T: WebhookTransport + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T> WebhookDispatcher<T>
where
    T: WebhookTransport + Send + Sync + 'static,
{
    pub fn new(transport: Arc<T>, config: Arc<WebhookConfig>) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Deliver `event` to one webhook, retrying with backoff.
    ///
    /// Failed attempts are not errors: they are recorded in the returned
    /// outcome. `Err` means the delivery was rejected before the first
    /// attempt (bad URL, missing secret, unusable event name).
    pub async fn deliver_with_retries(
        &self,
        webhook: &WebhookRecord,
        event: &str,
        payload: Value,
    ) -> WebhookResult<DeliveryOutcome> {
        validate_target(webhook)?;
        if !is_valid_event_name(event) {
            return Err(WebhookError::InvalidEvent(event.to_string()));
        }

        let envelope = WebhookEnvelope::new(event, payload);
        let request = self.build_request(webhook, &envelope)?;
        let retry = self.config.retry;

        let mut attempts = Vec::new();

        for attempt_number in 1..=retry.max_attempts {
            let attempted_at = Utc::now();
            let (status_code, error_message) = match self.send(&request).await {
                Ok(status) if (200..300).contains(&status) => (Some(status), None),
                Ok(status) => (Some(status), Some(format!("HTTP {status}"))),
                Err(e) => (None, Some(e.to_string())),
            };
            let succeeded = error_message.is_none();

            attempts.push(DeliveryAttempt {
                webhook_id: webhook.id.into_uuid(),
                event: envelope.event.clone(),
                payload: envelope.payload.clone(),
                attempt_number,
                status_code,
                succeeded,
                error_message: error_message.clone(),
                attempted_at,
            });

            if succeeded {
                tracing::info!(
                    webhook_id = %webhook.id,
                    event = %envelope.event,
                    event_id = %envelope.id,
                    attempt = attempt_number,
                    status = status_code,
                    "Webhook delivered"
                );
                return Ok(DeliveryOutcome {
                    event_id: envelope.event_id(),
                    success: true,
                    attempts,
                });
            }

            if retry.should_retry(attempt_number) {
                let backoff = retry.backoff_for(attempt_number);
                tracing::warn!(
                    webhook_id = %webhook.id,
                    attempt = attempt_number,
                    status = status_code,
                    error = error_message.as_deref().unwrap_or_default(),
                    backoff_ms = backoff.as_millis() as u64,
                    "Webhook attempt failed, retrying"
                );
                tokio::time::sleep(backoff).await;
            } else {
                tracing::warn!(
                    webhook_id = %webhook.id,
                    attempt = attempt_number,
                    status = status_code,
                    error = error_message.as_deref().unwrap_or_default(),
                    "Webhook attempt failed"
                );
            }
        }

        tracing::error!(
            webhook_id = %webhook.id,
            event = %envelope.event,
            event_id = %envelope.id,
            attempts = attempts.len(),
            "Webhook delivery exhausted retries"
        );

        Ok(DeliveryOutcome {
            event_id: envelope.event_id(),
            success: false,
            attempts,
        })
    }

    /// One POST bounded by the configured request timeout
    async fn send(&self, request: &OutboundRequest) -> Result<u16, TransportError> {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.transport.post(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }

    fn build_request(
        &self,
        webhook: &WebhookRecord,
        envelope: &WebhookEnvelope,
    ) -> WebhookResult<OutboundRequest> {
        let body = envelope.to_body()?;
        let signature = sign_body(&webhook.secret, &body);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.config.user_agent)
                .map_err(|e| WebhookError::Internal(format!("Invalid user agent: {e}")))?,
        );
        headers.insert(
            X_WEBHOOK_EVENT,
            HeaderValue::from_str(&envelope.event)
                .map_err(|_| WebhookError::InvalidEvent(envelope.event.clone()))?,
        );
        headers.insert(X_WEBHOOK_ID, header_text(&envelope.id)?);
        headers.insert(
            X_WEBHOOK_TIMESTAMP,
            HeaderValue::from(envelope.timestamp.timestamp()),
        );
        headers.insert(X_WEBHOOK_SIGNATURE, header_text(&signature)?);

        Ok(OutboundRequest {
            url: webhook.url.clone(),
            headers,
            body,
        })
    }
}

fn header_text(value: &impl ToString) -> WebhookResult<HeaderValue> {
    HeaderValue::from_str(&value.to_string())
        .map_err(|e| WebhookError::Internal(format!("Invalid header value: {e}")))
}

/// Reject deliveries that can never succeed
fn validate_target(webhook: &WebhookRecord) -> WebhookResult<()> {
    let url = reqwest::Url::parse(&webhook.url)
        .map_err(|e| WebhookError::InvalidUrl(format!("{}: {e}", webhook.url)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(WebhookError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(WebhookError::InvalidUrl(format!("{}: missing host", webhook.url)));
    }
    if webhook.secret.trim().is_empty() {
        return Err(WebhookError::MissingSecret);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::id::{ProjectId, WebhookId};

    fn webhook(url: &str, secret: &str) -> WebhookRecord {
        WebhookRecord {
            id: WebhookId::new(),
            project_id: ProjectId::new(),
            url: url.into(),
            secret: secret.into(),
            events: Default::default(),
            is_active: true,
        }
    }

    #[test]
    fn test_validate_target() {
        assert!(validate_target(&webhook("https://example.com/hook", "s")).is_ok());
        assert!(validate_target(&webhook("http://localhost:8080/hook", "s")).is_ok());

        assert!(matches!(
            validate_target(&webhook("not a url", "s")),
            Err(WebhookError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_target(&webhook("ftp://example.com/hook", "s")),
            Err(WebhookError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_target(&webhook("https://example.com/hook", "  ")),
            Err(WebhookError::MissingSecret)
        ));
    }
}
