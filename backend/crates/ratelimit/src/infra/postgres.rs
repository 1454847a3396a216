//! PostgreSQL Counter Store
//!
//! Counters as rows: `INSERT .. ON CONFLICT DO UPDATE .. RETURNING` is the
//! single-key atomic increment. Expiry is written only when the row is
//! created; `cleanup_expired` removes rows past it.

use chrono::Utc;
use platform::rate_limit::{CounterStore, CounterStoreError};
use sqlx::PgPool;
use std::time::Duration;

use crate::error::RateLimitResult;

/// PostgreSQL-backed counter store
#[derive(Clone)]
pub struct PgCounterStore {
    pool: PgPool,
}

impl PgCounterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete counters whose window has expired
    pub async fn cleanup_expired(&self) -> RateLimitResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM rate_limit_counters WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(counters = deleted, "Cleaned up expired rate limit counters");

        Ok(deleted)
    }
}

impl CounterStore for PgCounterStore {
    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, CounterStoreError> {
        let expires_at_ms = Utc::now().timestamp_millis() + ttl.as_millis() as i64;

        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO rate_limit_counters (counter_key, request_count, expires_at_ms)
            VALUES ($1, 1, $2)
            ON CONFLICT (counter_key)
            DO UPDATE SET request_count = rate_limit_counters.request_count + 1
            RETURNING request_count
            "#,
        )
        .bind(key)
        .bind(expires_at_ms)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.0)
    }
}

fn store_error(err: sqlx::Error) -> CounterStoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            CounterStoreError::Unavailable(err.to_string())
        }
        other => CounterStoreError::Backend(Box::new(other)),
    }
}
