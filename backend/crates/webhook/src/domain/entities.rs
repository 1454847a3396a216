//! Domain Entities

use chrono::{DateTime, Utc};
use kernel::id::{ProjectId, WebhookDeliveryId, WebhookEventId, WebhookId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Subscribes a webhook to every event
pub const WILDCARD_EVENT: &str = "*";

pub const MAX_EVENT_NAME_LEN: usize = 128;

/// Dotted event names such as `feedback.created`; the wildcard is not an event.
pub fn is_valid_event_name(event: &str) -> bool {
    !event.is_empty()
        && event.len() <= MAX_EVENT_NAME_LEN
        && event
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ':'))
}

/// Webhook registered on a project (owned by the data store, read-only here)
#[derive(Clone)]
pub struct WebhookRecord {
    pub id: WebhookId,
    pub project_id: ProjectId,
    pub url: String,
    pub secret: String,
    pub events: BTreeSet<String>,
    pub is_active: bool,
}

impl WebhookRecord {
    /// An empty event set subscribes to everything.
    pub fn subscribes_to(&self, event: &str) -> bool {
        self.events.is_empty()
            || self.events.contains(WILDCARD_EVENT)
            || self.events.contains(event)
    }
}

impl fmt::Debug for WebhookRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookRecord")
            .field("id", &self.id)
            .field("project_id", &self.project_id)
            .field("url", &self.url)
            .field("secret", &"[redacted]")
            .field("events", &self.events)
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// JSON body sent to receivers
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEnvelope {
    /// Dedupe key for receivers
    pub id: Uuid,
    pub event: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl WebhookEnvelope {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            id: WebhookEventId::new().into_uuid(),
            event: event.into(),
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn event_id(&self) -> WebhookEventId {
        WebhookEventId::from_uuid(self.id)
    }

    /// Exact bytes that are signed and transmitted
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// One HTTP attempt of one delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAttempt {
    pub webhook_id: Uuid,
    pub event: String,
    /// Kept in memory only; the delivery record stores the payload once.
    #[serde(skip, default)]
    pub payload: Value,
    pub attempt_number: u32,
    pub status_code: Option<u16>,
    pub succeeded: bool,
    pub error_message: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

/// Result of `deliver_with_retries`
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub event_id: WebhookEventId,
    pub success: bool,
    /// In order, numbered from 1
    pub attempts: Vec<DeliveryAttempt>,
}

impl DeliveryOutcome {
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    pub fn last_attempt(&self) -> Option<&DeliveryAttempt> {
        self.attempts.last()
    }

    /// Exhausted deliveries as [`WebhookError::DeliveryFailed`](crate::error::WebhookError::DeliveryFailed)
    pub fn into_result(self) -> crate::error::WebhookResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(crate::error::WebhookError::DeliveryFailed {
                attempts: self.attempts,
            })
        }
    }
}

/// Persisted delivery history row
#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    pub id: WebhookDeliveryId,
    pub webhook_id: WebhookId,
    pub event_id: WebhookEventId,
    pub event: String,
    pub payload: Value,
    pub succeeded: bool,
    pub attempt_count: u32,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub attempts: Vec<DeliveryAttempt>,
    pub delivered_at: DateTime<Utc>,
}

impl DeliveryRecord {
    /// Summarize an outcome by its final attempt
    pub fn from_outcome(
        webhook_id: WebhookId,
        event: &str,
        payload: Value,
        outcome: DeliveryOutcome,
    ) -> Self {
        let last = outcome.last_attempt();
        let status_code = last.and_then(|a| a.status_code);
        let error_message = last.and_then(|a| a.error_message.clone());
        let delivered_at = last.map(|a| a.attempted_at).unwrap_or_else(Utc::now);

        Self {
            id: WebhookDeliveryId::new(),
            webhook_id,
            event_id: outcome.event_id,
            event: event.to_string(),
            payload,
            succeeded: outcome.success,
            attempt_count: outcome.attempts.len() as u32,
            status_code,
            error_message,
            attempts: outcome.attempts,
            delivered_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn webhook(events: &[&str]) -> WebhookRecord {
        WebhookRecord {
            id: WebhookId::new(),
            project_id: ProjectId::new(),
            url: "https://example.com/hook".into(),
            secret: "whsec_live_123".into(),
            events: events.iter().map(|e| e.to_string()).collect(),
            is_active: true,
        }
    }

    fn attempt(n: u32, status: Option<u16>, ok: bool) -> DeliveryAttempt {
        DeliveryAttempt {
            webhook_id: Uuid::nil(),
            event: "feedback.created".into(),
            payload: json!({"id": 1}),
            attempt_number: n,
            status_code: status,
            succeeded: ok,
            error_message: (!ok).then(|| format!("HTTP {}", status.unwrap_or(0))),
            attempted_at: Utc::now(),
        }
    }

    #[test]
    fn test_subscriptions() {
        assert!(webhook(&[]).subscribes_to("poll.closed"));
        assert!(webhook(&["*"]).subscribes_to("poll.closed"));
        assert!(webhook(&["feedback.created"]).subscribes_to("feedback.created"));
        assert!(!webhook(&["feedback.created"]).subscribes_to("poll.closed"));
    }

    #[test]
    fn test_event_names() {
        assert!(is_valid_event_name("feedback.created"));
        assert!(is_valid_event_name("poll:closed_v2"));
        assert!(!is_valid_event_name(""));
        assert!(!is_valid_event_name("*"));
        assert!(!is_valid_event_name("feedback created"));
        assert!(!is_valid_event_name(&"a".repeat(MAX_EVENT_NAME_LEN + 1)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", webhook(&[]));
        assert!(!debug.contains("whsec_live_123"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn test_envelope_body_shape() {
        let envelope = WebhookEnvelope::new("feedback.created", json!({"title": "Dark mode"}));
        let body: Value = serde_json::from_slice(&envelope.to_body().unwrap()).unwrap();

        assert_eq!(body["event"], "feedback.created");
        assert_eq!(body["payload"]["title"], "Dark mode");
        assert_eq!(body["id"], envelope.id.to_string());
        assert!(body["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_attempt_json_omits_payload() {
        let json = serde_json::to_value(attempt(1, Some(500), false)).unwrap();
        assert!(json.get("payload").is_none());
        assert_eq!(json["attemptNumber"], 1);
        assert_eq!(json["statusCode"], 500);
    }

    #[test]
    fn test_record_from_outcome_uses_last_attempt() {
        let outcome = DeliveryOutcome {
            event_id: WebhookEventId::new(),
            success: true,
            attempts: vec![attempt(1, Some(503), false), attempt(2, Some(204), true)],
        };
        let record =
            DeliveryRecord::from_outcome(WebhookId::new(), "feedback.created", json!({}), outcome);

        assert!(record.succeeded);
        assert_eq!(record.attempt_count, 2);
        assert_eq!(record.status_code, Some(204));
        assert_eq!(record.error_message, None);
    }

    #[test]
    fn test_into_result() {
        let failed = DeliveryOutcome {
            event_id: WebhookEventId::new(),
            success: false,
            attempts: vec![attempt(1, Some(500), false)],
        };
        match failed.into_result() {
            Err(crate::error::WebhookError::DeliveryFailed { attempts }) => {
                assert_eq!(attempts.len(), 1)
            }
            other => panic!("expected DeliveryFailed, got {other:?}"),
        }
    }
}
