//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; handlers answer with
//! `kernel::error::AppError` through each crate's error type.

mod config;
mod identity;

use axum::{
    Router,
    http::{Method, header},
    middleware::from_fn_with_state,
};
use ratelimit::presentation::headers::{X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET};
use ratelimit::{PgCounterStore, PolicyCatalog, RateLimitState, RateLimiter, enforce_rate_limit};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webhook::{PgWebhookRepository, ReqwestTransport, webhook_router};

use crate::config::AppConfig;
use crate::identity::{IdentityClient, resolve_identity};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,ratelimit=info,webhook=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: remove counters of past windows
    // Errors here should not prevent server startup
    let counter_store = PgCounterStore::new(pool.clone());
    if let Err(e) = counter_store.cleanup_expired().await {
        tracing::warn!(
            error = %e,
            "Rate limit counter cleanup failed, continuing anyway"
        );
    }

    let limiter = RateLimiter::new(Arc::new(counter_store), Arc::new(config.rate_limit));

    let identity_client = IdentityClient::new(config.identity_service_url.as_deref())?;
    if config.identity_service_url.is_none() {
        tracing::warn!("IDENTITY_SERVICE_URL not set, all callers are anonymous");
    }

    let transport = ReqwestTransport::from_config(&config.webhook)?;
    let webhooks = webhook_router(
        PgWebhookRepository::new(pool.clone()),
        transport,
        config.webhook,
    )
    .layer(from_fn_with_state(
        RateLimitState::new(limiter.clone(), PolicyCatalog::WRITE),
        enforce_rate_limit::<PgCounterStore>,
    ));

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(config.frontend_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .expose_headers([
            header::RETRY_AFTER,
            X_RATELIMIT_LIMIT,
            X_RATELIMIT_REMAINING,
            X_RATELIMIT_RESET,
        ])
        .allow_credentials(true);

    // Build router
    // Later layers wrap earlier ones: identity resolves before any rate limit check
    let app = Router::new()
        .nest("/api/projects/{project_id}/webhooks", webhooks)
        .layer(from_fn_with_state(
            RateLimitState::new(limiter, PolicyCatalog::API),
            enforce_rate_limit::<PgCounterStore>,
        ))
        .layer(from_fn_with_state(identity_client, resolve_identity))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
