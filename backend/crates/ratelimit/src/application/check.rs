//! Rate Limit Check Use Case

use chrono::{DateTime, Utc};
use platform::rate_limit::{CounterStore, CounterStoreError, RateLimitDecision, RateLimitPolicy};
use std::sync::Arc;

use crate::application::config::RateLimitConfig;
use crate::domain::subject::Subject;
use crate::error::{RateLimitError, RateLimitResult};

/// Fixed-window rate limiter over an external counter store
pub struct RateLimiter<S>
where
    S: CounterStore + Send + Sync + 'static,
{
    store: Arc<S>,
    config: Arc<RateLimitConfig>,
}

impl<S> Clone for RateLimiter<S>
where
    S: CounterStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S> RateLimiter<S>
where
    S: CounterStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, config: Arc<RateLimitConfig>) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request by `subject_key` against `policy`.
    ///
    /// Never fails: if the counter store errors or exceeds the configured
    /// timeout the request is allowed with a full quota.
    pub async fn check(&self, subject_key: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        self.check_at(subject_key, policy, Utc::now()).await
    }

    pub async fn check_at(
        &self,
        subject_key: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let window_id = policy.window_id(now);
        let key = policy.counter_key(subject_key, window_id);

        let timeout = self.config.store_timeout;
        let count = match tokio::time::timeout(timeout, self.store.increment(&key, policy.window()))
            .await
        {
            Ok(Ok(count)) => count,
            Ok(Err(e)) => return Self::fail_open(policy, now, &e),
            Err(_) => return Self::fail_open(policy, now, &CounterStoreError::Timeout(timeout)),
        };

        let decision = RateLimitDecision::from_count(policy, window_id, count);

        if !decision.allowed {
            tracing::warn!(
                policy = policy.name(),
                limit = decision.limit,
                count = count,
                "Rate limit exceeded"
            );
        }

        decision
    }

    /// Resolve the named policy for `subject` and count one request.
    pub async fn check_subject(&self, subject: &Subject, policy_name: &str) -> RateLimitDecision {
        let policy = self.config.catalog.resolve(policy_name, subject);
        self.check(&subject.key(), policy).await
    }

    /// Like [`check_subject`](Self::check_subject) but denial is an error.
    pub async fn enforce(
        &self,
        subject: &Subject,
        policy_name: &str,
    ) -> RateLimitResult<RateLimitDecision> {
        let decision = self.check_subject(subject, policy_name).await;
        if decision.allowed {
            Ok(decision)
        } else {
            Err(RateLimitError::Exceeded(decision))
        }
    }

    fn fail_open(
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
        error: &CounterStoreError,
    ) -> RateLimitDecision {
        tracing::warn!(
            policy = policy.name(),
            error = %error,
            "Counter store unavailable, failing open"
        );
        RateLimitDecision::fail_open(policy, now)
    }
}
