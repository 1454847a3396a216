//! Webhook Delivery Module
//!
//! Clean Architecture structure:
//! - `domain/` - Webhook records, delivery attempts, retry policy, signing, transport/repository traits
//! - `application/` - [`WebhookDispatcher`] and the background fan-out use case
//! - `infra/` - reqwest transport, PostgreSQL and in-memory repositories
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Delivery Model
//! - Each delivery is signed with HMAC-SHA256 over the exact body sent
//! - Failed attempts are retried inline with capped exponential backoff
//! - Delivery is at-least-once; receivers dedupe on the envelope `id`
//! - Deliveries run on spawned tasks; request handlers never wait on them

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::WebhookConfig;
pub use application::dispatcher::WebhookDispatcher;
pub use application::publish::PublishEventUseCase;
pub use domain::entities::{
    DeliveryAttempt, DeliveryOutcome, DeliveryRecord, WebhookEnvelope, WebhookRecord,
};
pub use domain::retry::RetryPolicy;
pub use domain::signature::{sign_body, verify_signature};
pub use error::{WebhookError, WebhookResult};
pub use infra::http::ReqwestTransport;
pub use infra::memory::MemoryWebhookRepository;
pub use infra::postgres::PgWebhookRepository;
pub use presentation::router::{webhook_router, webhook_router_generic};
