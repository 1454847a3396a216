//! Webhook Router
//!
//! Mounted by the binary under `/api/projects/{project_id}/webhooks`.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::WebhookConfig;
use crate::application::dispatcher::WebhookDispatcher;
use crate::application::publish::PublishEventUseCase;
use crate::domain::repository::{DeliveryRepository, WebhookRepository};
use crate::domain::transport::WebhookTransport;
use crate::infra::http::ReqwestTransport;
use crate::infra::postgres::PgWebhookRepository;
use crate::presentation::handlers::{self, WebhookAppState};

/// Create the webhook router with PostgreSQL repository and reqwest transport
pub fn webhook_router(
    repo: PgWebhookRepository,
    transport: ReqwestTransport,
    config: WebhookConfig,
) -> Router {
    webhook_router_generic(repo, transport, config)
}

/// Create a generic webhook router for any repository and transport
pub fn webhook_router_generic<R, T>(repo: R, transport: T, config: WebhookConfig) -> Router
where
    R: WebhookRepository + DeliveryRepository + Send + Sync + 'static,
    T: WebhookTransport + Send + Sync + 'static,
{
    let repo = Arc::new(repo);
    let dispatcher = WebhookDispatcher::new(Arc::new(transport), Arc::new(config));
    let state = WebhookAppState {
        repo: repo.clone(),
        publish: PublishEventUseCase::new(repo, dispatcher),
    };

    Router::new()
        .route("/events", post(handlers::publish_event::<R, T>))
        .route("/{webhook_id}/test", post(handlers::test_webhook::<R, T>))
        .route(
            "/{webhook_id}/deliveries",
            get(handlers::list_deliveries::<R, T>),
        )
        .with_state(state)
}
