//! Rate Limiting Module
//!
//! Clean Architecture structure:
//! - `domain/` - Subjects (account or anonymized client) and the plan-aware policy catalog
//! - `application/` - [`RateLimiter`] and its configuration
//! - `infra/` - Counter stores (PostgreSQL, in-memory)
//! - `presentation/` - Axum middleware and `X-RateLimit-*` headers
//!
//! ## Model
//! - Fixed-window counters keyed by `(policy, subject, window)` held outside the process
//! - One atomic increment per check; no in-process shared state
//! - Counter store outages fail open: requests are allowed and the failure is logged
//! - Anonymous callers are keyed by a salted hash of their IP, never the raw address

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::check::RateLimiter;
pub use application::config::RateLimitConfig;
pub use domain::policy::{PlanQuotas, PolicyCatalog, PolicySet};
pub use domain::subject::Subject;
pub use error::{RateLimitError, RateLimitResult};
pub use infra::memory::MemoryCounterStore;
pub use infra::postgres::PgCounterStore;
pub use presentation::middleware::{RateLimitState, enforce_rate_limit};

pub use platform::rate_limit::{
    CounterStore, CounterStoreError, PolicyError, RateLimitDecision, RateLimitPolicy,
};
