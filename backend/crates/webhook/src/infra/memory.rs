//! In-memory Repository
//!
//! Webhooks and delivery history held in process memory, for tests and
//! local development without a database.

use kernel::id::{ProjectId, WebhookId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::entities::{DeliveryRecord, WebhookRecord};
use crate::domain::repository::{DeliveryRepository, WebhookRepository};
use crate::error::{WebhookError, WebhookResult};

#[derive(Debug, Default)]
struct Store {
    webhooks: HashMap<WebhookId, WebhookRecord>,
    deliveries: Vec<DeliveryRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryWebhookRepository {
    store: Arc<Mutex<Store>>,
}

impl MemoryWebhookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, webhook: WebhookRecord) -> WebhookResult<()> {
        self.lock()?.webhooks.insert(webhook.id, webhook);
        Ok(())
    }

    /// Every recorded delivery, oldest first
    pub fn deliveries(&self) -> WebhookResult<Vec<DeliveryRecord>> {
        Ok(self.lock()?.deliveries.clone())
    }

    fn lock(&self) -> WebhookResult<std::sync::MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|_| WebhookError::Internal("webhook store lock poisoned".into()))
    }
}

impl WebhookRepository for MemoryWebhookRepository {
    async fn find(
        &self,
        project_id: ProjectId,
        webhook_id: WebhookId,
    ) -> WebhookResult<Option<WebhookRecord>> {
        Ok(self
            .lock()?
            .webhooks
            .get(&webhook_id)
            .filter(|w| w.project_id == project_id)
            .cloned())
    }

    async fn find_subscribed(
        &self,
        project_id: ProjectId,
        event: &str,
    ) -> WebhookResult<Vec<WebhookRecord>> {
        Ok(self
            .lock()?
            .webhooks
            .values()
            .filter(|w| w.project_id == project_id && w.is_active && w.subscribes_to(event))
            .cloned()
            .collect())
    }
}

impl DeliveryRepository for MemoryWebhookRepository {
    async fn record(&self, delivery: &DeliveryRecord) -> WebhookResult<()> {
        self.lock()?.deliveries.push(delivery.clone());
        Ok(())
    }

    async fn list_recent(
        &self,
        webhook_id: WebhookId,
        limit: i64,
    ) -> WebhookResult<Vec<DeliveryRecord>> {
        let store = self.lock()?;
        let mut recent: Vec<DeliveryRecord> = store
            .deliveries
            .iter()
            .rev()
            .filter(|d| d.webhook_id == webhook_id)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.delivered_at.cmp(&a.delivered_at));
        recent.truncate(limit.max(0) as usize);
        Ok(recent)
    }
}
