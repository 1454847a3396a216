//! Publish Event Use Case
//!
//! Fans an event out to every subscribed webhook of a project. Each
//! delivery runs on its own task and writes its history row when done.

use kernel::id::ProjectId;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::application::dispatcher::WebhookDispatcher;
use crate::domain::entities::{DeliveryRecord, WebhookRecord};
use crate::domain::repository::{DeliveryRepository, WebhookRepository};
use crate::domain::transport::WebhookTransport;
use crate::error::WebhookResult;

pub struct PublishEventUseCase<R, T>
where
    R: WebhookRepository + DeliveryRepository + Send + Sync + 'static,
    T: WebhookTransport + Send + Sync + 'static,
{
    repo: Arc<R>,
    dispatcher: WebhookDispatcher<T>,
}

impl<R, T> Clone for PublishEventUseCase<R, T>
where
    R: WebhookRepository + DeliveryRepository + Send + Sync + 'static,
    T: WebhookTransport + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<R, T> PublishEventUseCase<R, T>
where
    R: WebhookRepository + DeliveryRepository + Send + Sync + 'static,
    T: WebhookTransport + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, dispatcher: WebhookDispatcher<T>) -> Self {
        Self { repo, dispatcher }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Queue `event` for every active subscriber in the project.
    ///
    /// Returns as soon as the tasks are spawned.
    pub async fn execute(
        &self,
        project_id: ProjectId,
        event: &str,
        payload: Value,
    ) -> WebhookResult<Vec<JoinHandle<()>>> {
        let webhooks = self.repo.find_subscribed(project_id, event).await?;

        tracing::debug!(
            project_id = %project_id,
            event = %event,
            subscribers = webhooks.len(),
            "Publishing webhook event"
        );

        Ok(webhooks
            .into_iter()
            .map(|webhook| self.spawn_delivery(webhook, event.to_string(), payload.clone()))
            .collect())
    }

    /// Deliver to one webhook in the background and persist the outcome
    pub fn spawn_delivery(
        &self,
        webhook: WebhookRecord,
        event: String,
        payload: Value,
    ) -> JoinHandle<()> {
        let repo = self.repo.clone();
        let dispatcher = self.dispatcher.clone();

        tokio::spawn(async move {
            let outcome = match dispatcher
                .deliver_with_retries(&webhook, &event, payload.clone())
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(
                        webhook_id = %webhook.id,
                        event = %event,
                        error = %e,
                        "Webhook delivery rejected"
                    );
                    return;
                }
            };

            let record = DeliveryRecord::from_outcome(webhook.id, &event, payload, outcome);
            if let Err(e) = repo.record(&record).await {
                tracing::error!(
                    webhook_id = %webhook.id,
                    delivery_id = %record.id,
                    error = %e,
                    "Failed to record webhook delivery"
                );
            }
        })
    }
}
