//! HTTP Handlers
//!
//! Handlers require an authenticated [`Identity`] but do not check that it
//! belongs to `project_id`. Project membership lives with the external
//! identity service, which must only issue sessions for callers that may
//! act on the projects they address.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use kernel::id::{ProjectId, WebhookId};
use kernel::identity::Identity;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::publish::PublishEventUseCase;
use crate::domain::entities::is_valid_event_name;
use crate::domain::repository::{DeliveryRepository, WebhookRepository};
use crate::domain::transport::WebhookTransport;
use crate::error::{WebhookError, WebhookResult};
use crate::presentation::dto::{
    DeliveriesQuery, DeliveriesResponse, PublishEventRequest, PublishEventResponse,
    TestWebhookResponse,
};

pub const TEST_EVENT: &str = "webhook.test";

/// Shared state for webhook handlers
pub struct WebhookAppState<R, T>
where
    R: WebhookRepository + DeliveryRepository + Send + Sync + 'static,
    T: WebhookTransport + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub publish: PublishEventUseCase<R, T>,
}

impl<R, T> Clone for WebhookAppState<R, T>
where
    R: WebhookRepository + DeliveryRepository + Send + Sync + 'static,
    T: WebhookTransport + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            publish: self.publish.clone(),
        }
    }
}

// ============================================================================
// Test Delivery
// ============================================================================

/// POST /api/projects/{project_id}/webhooks/{webhook_id}/test
///
/// Any authenticated caller; project membership is not checked here.
pub async fn test_webhook<R, T>(
    State(state): State<WebhookAppState<R, T>>,
    identity: Identity,
    Path((project_id, webhook_id)): Path<(Uuid, Uuid)>,
) -> WebhookResult<(StatusCode, Json<TestWebhookResponse>)>
where
    R: WebhookRepository + DeliveryRepository + Send + Sync + 'static,
    T: WebhookTransport + Send + Sync + 'static,
{
    let webhook = state
        .repo
        .find(ProjectId::from_uuid(project_id), WebhookId::from_uuid(webhook_id))
        .await?
        .ok_or(WebhookError::WebhookNotFound)?;

    if !webhook.is_active {
        return Err(WebhookError::WebhookInactive);
    }

    tracing::info!(
        webhook_id = %webhook.id,
        subject_id = %identity.subject_id,
        "Queueing test webhook delivery"
    );

    let payload = json!({
        "message": "Test webhook delivery",
        "webhookId": webhook.id.into_uuid(),
    });
    state
        .publish
        .spawn_delivery(webhook, TEST_EVENT.to_string(), payload);

    Ok((
        StatusCode::ACCEPTED,
        Json(TestWebhookResponse { event_queued: true }),
    ))
}

// ============================================================================
// Delivery History
// ============================================================================

/// GET /api/projects/{project_id}/webhooks/{webhook_id}/deliveries
///
/// Any authenticated caller; project membership is not checked here.
pub async fn list_deliveries<R, T>(
    State(state): State<WebhookAppState<R, T>>,
    _identity: Identity,
    Path((project_id, webhook_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<DeliveriesQuery>,
) -> WebhookResult<Json<DeliveriesResponse>>
where
    R: WebhookRepository + DeliveryRepository + Send + Sync + 'static,
    T: WebhookTransport + Send + Sync + 'static,
{
    let webhook = state
        .repo
        .find(ProjectId::from_uuid(project_id), WebhookId::from_uuid(webhook_id))
        .await?
        .ok_or(WebhookError::WebhookNotFound)?;

    let deliveries = state.repo.list_recent(webhook.id, query.limit()).await?;

    Ok(Json(DeliveriesResponse {
        deliveries: deliveries.into_iter().map(Into::into).collect(),
    }))
}

// ============================================================================
// Publish Event
// ============================================================================

/// POST /api/projects/{project_id}/webhooks/events
pub async fn publish_event<R, T>(
    State(state): State<WebhookAppState<R, T>>,
    identity: Identity,
    Path(project_id): Path<Uuid>,
    Json(req): Json<PublishEventRequest>,
) -> WebhookResult<(StatusCode, Json<PublishEventResponse>)>
where
    R: WebhookRepository + DeliveryRepository + Send + Sync + 'static,
    T: WebhookTransport + Send + Sync + 'static,
{
    if !identity.role.is_admin() {
        return Err(WebhookError::Forbidden(
            "Publishing events requires the admin role".into(),
        ));
    }
    if !is_valid_event_name(&req.event) {
        return Err(WebhookError::InvalidEvent(req.event));
    }

    let handles = state
        .publish
        .execute(ProjectId::from_uuid(project_id), &req.event, req.payload)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(PublishEventResponse {
            deliveries_queued: handles.len(),
        }),
    ))
}
