//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::entities::{DeliveryAttempt, DeliveryRecord};

pub const DEFAULT_DELIVERY_LIMIT: i64 = 20;
pub const MAX_DELIVERY_LIMIT: i64 = 100;

// ============================================================================
// Test Delivery
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestWebhookResponse {
    pub event_queued: bool,
}

// ============================================================================
// Publish Event
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishEventRequest {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishEventResponse {
    pub deliveries_queued: usize,
}

// ============================================================================
// Delivery History
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveriesQuery {
    pub limit: Option<i64>,
}

impl DeliveriesQuery {
    /// Clamped to `1..=MAX_DELIVERY_LIMIT`
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_DELIVERY_LIMIT)
            .clamp(1, MAX_DELIVERY_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub event: String,
    pub payload: Value,
    pub succeeded: bool,
    pub attempt_count: u32,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub attempts: Vec<DeliveryAttempt>,
    pub delivered_at: DateTime<Utc>,
}

impl From<DeliveryRecord> for DeliveryResponse {
    fn from(record: DeliveryRecord) -> Self {
        Self {
            id: record.id.into_uuid(),
            event_id: record.event_id.into_uuid(),
            event: record.event,
            payload: record.payload,
            succeeded: record.succeeded,
            attempt_count: record.attempt_count,
            status_code: record.status_code,
            error_message: record.error_message,
            attempts: record.attempts,
            delivered_at: record.delivered_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveriesResponse {
    pub deliveries: Vec<DeliveryResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_limit_clamping() {
        assert_eq!(DeliveriesQuery { limit: None }.limit(), 20);
        assert_eq!(DeliveriesQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(DeliveriesQuery { limit: Some(50) }.limit(), 50);
        assert_eq!(DeliveriesQuery { limit: Some(1000) }.limit(), 100);
    }
}
