//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{ProjectId, WebhookDeliveryId, WebhookEventId, WebhookId};
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::entities::{DeliveryAttempt, DeliveryRecord, WebhookRecord};
use crate::domain::repository::{DeliveryRepository, WebhookRepository};
use crate::error::WebhookResult;

/// PostgreSQL-backed webhook and delivery history repository
#[derive(Clone)]
pub struct PgWebhookRepository {
    pool: PgPool,
}

impl PgWebhookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Webhook Repository Implementation
// ============================================================================

impl WebhookRepository for PgWebhookRepository {
    async fn find(
        &self,
        project_id: ProjectId,
        webhook_id: WebhookId,
    ) -> WebhookResult<Option<WebhookRecord>> {
        let row = sqlx::query_as::<_, WebhookRow>(
            r#"
            SELECT
                webhook_id,
                project_id,
                url,
                secret,
                events,
                is_active
            FROM webhooks
            WHERE project_id = $1 AND webhook_id = $2
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(webhook_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(WebhookRow::into_record))
    }

    async fn find_subscribed(
        &self,
        project_id: ProjectId,
        event: &str,
    ) -> WebhookResult<Vec<WebhookRecord>> {
        let rows = sqlx::query_as::<_, WebhookRow>(
            r#"
            SELECT
                webhook_id,
                project_id,
                url,
                secret,
                events,
                is_active
            FROM webhooks
            WHERE project_id = $1
              AND is_active
              AND (cardinality(events) = 0 OR $2 = ANY(events) OR '*' = ANY(events))
            ORDER BY created_at
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(event)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WebhookRow::into_record).collect())
    }
}

// ============================================================================
// Delivery Repository Implementation
// ============================================================================

impl DeliveryRepository for PgWebhookRepository {
    async fn record(&self, delivery: &DeliveryRecord) -> WebhookResult<()> {
        sqlx::query(
            r#"
            INSERT INTO webhook_deliveries (
                delivery_id,
                webhook_id,
                event_id,
                event,
                payload,
                succeeded,
                attempt_count,
                status_code,
                error_message,
                attempts,
                delivered_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(delivery.id.as_uuid())
        .bind(delivery.webhook_id.as_uuid())
        .bind(delivery.event_id.as_uuid())
        .bind(&delivery.event)
        .bind(Json(&delivery.payload))
        .bind(delivery.succeeded)
        .bind(delivery.attempt_count as i32)
        .bind(delivery.status_code.map(i32::from))
        .bind(delivery.error_message.as_deref())
        .bind(Json(&delivery.attempts))
        .bind(delivery.delivered_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_recent(
        &self,
        webhook_id: WebhookId,
        limit: i64,
    ) -> WebhookResult<Vec<DeliveryRecord>> {
        let rows = sqlx::query_as::<_, DeliveryRow>(
            r#"
            SELECT
                delivery_id,
                webhook_id,
                event_id,
                event,
                payload,
                succeeded,
                attempt_count,
                status_code,
                error_message,
                attempts,
                delivered_at
            FROM webhook_deliveries
            WHERE webhook_id = $1
            ORDER BY delivered_at DESC
            LIMIT $2
            "#,
        )
        .bind(webhook_id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DeliveryRow::into_record).collect())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct WebhookRow {
    webhook_id: Uuid,
    project_id: Uuid,
    url: String,
    secret: String,
    events: Vec<String>,
    is_active: bool,
}

impl WebhookRow {
    fn into_record(self) -> WebhookRecord {
        WebhookRecord {
            id: WebhookId::from_uuid(self.webhook_id),
            project_id: ProjectId::from_uuid(self.project_id),
            url: self.url,
            secret: self.secret,
            events: self.events.into_iter().collect(),
            is_active: self.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DeliveryRow {
    delivery_id: Uuid,
    webhook_id: Uuid,
    event_id: Uuid,
    event: String,
    payload: Json<Value>,
    succeeded: bool,
    attempt_count: i32,
    status_code: Option<i32>,
    error_message: Option<String>,
    attempts: Json<Vec<DeliveryAttempt>>,
    delivered_at: DateTime<Utc>,
}

impl DeliveryRow {
    fn into_record(self) -> DeliveryRecord {
        DeliveryRecord {
            id: WebhookDeliveryId::from_uuid(self.delivery_id),
            webhook_id: WebhookId::from_uuid(self.webhook_id),
            event_id: WebhookEventId::from_uuid(self.event_id),
            event: self.event,
            payload: self.payload.0,
            succeeded: self.succeeded,
            attempt_count: self.attempt_count.max(0) as u32,
            status_code: self.status_code.and_then(|s| u16::try_from(s).ok()),
            error_message: self.error_message,
            attempts: self.attempts.0,
            delivered_at: self.delivered_at,
        }
    }
}
