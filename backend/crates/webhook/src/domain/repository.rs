//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::{ProjectId, WebhookId};

use crate::domain::entities::{DeliveryRecord, WebhookRecord};
use crate::error::WebhookResult;

#[trait_variant::make(WebhookRepository: Send)]
pub trait LocalWebhookRepository {
    /// Webhook by id, scoped to its project
    async fn find(
        &self,
        project_id: ProjectId,
        webhook_id: WebhookId,
    ) -> WebhookResult<Option<WebhookRecord>>;

    /// Active webhooks of a project subscribed to `event`
    async fn find_subscribed(
        &self,
        project_id: ProjectId,
        event: &str,
    ) -> WebhookResult<Vec<WebhookRecord>>;
}

#[trait_variant::make(DeliveryRepository: Send)]
pub trait LocalDeliveryRepository {
    async fn record(&self, delivery: &DeliveryRecord) -> WebhookResult<()>;

    /// Most recent first
    async fn list_recent(
        &self,
        webhook_id: WebhookId,
        limit: i64,
    ) -> WebhookResult<Vec<DeliveryRecord>>;
}
