//! Rate Limiting Infrastructure
//!
//! Fixed-window counter primitives shared by every rate limiter:
//! the immutable [`RateLimitPolicy`], the per-call [`RateLimitDecision`],
//! and the [`CounterStore`] seam that holds the counters outside the process.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Rate limit policy
///
/// Always valid once constructed: a zero window or zero quota is rejected
/// by [`RateLimitPolicy::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    name: String,
    max_requests: u32,
    window_seconds: u64,
}

/// Invalid policy configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("rate limit policy name must not be empty")]
    EmptyName,
    #[error("rate limit policy '{0}' has a zero-length window")]
    ZeroWindow(String),
    #[error("rate limit policy '{0}' allows zero requests")]
    ZeroMaxRequests(String),
}

impl RateLimitPolicy {
    pub fn new(
        name: impl Into<String>,
        max_requests: u32,
        window_seconds: u64,
    ) -> Result<Self, PolicyError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PolicyError::EmptyName);
        }
        if window_seconds == 0 {
            return Err(PolicyError::ZeroWindow(name));
        }
        if max_requests == 0 {
            return Err(PolicyError::ZeroMaxRequests(name));
        }
        Ok(Self {
            name,
            max_requests,
            window_seconds,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window_seconds(&self) -> u64 {
        self.window_seconds
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    /// `floor(now / window)`
    pub fn window_id(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(self.window_seconds as i64)
    }

    /// End of the given window, i.e. start of the next one
    pub fn window_reset_at(&self, window_id: i64) -> DateTime<Utc> {
        let secs = (window_id + 1).saturating_mul(self.window_seconds as i64);
        DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Counter key for one subject in one window
    pub fn counter_key(&self, subject_key: &str, window_id: i64) -> String {
        format!("rl:{}:{}:{}", self.name, subject_key, window_id)
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Decision for the `count`-th request of `window_id`
    pub fn from_count(policy: &RateLimitPolicy, window_id: i64, count: i64) -> Self {
        let limit = policy.max_requests();
        let remaining = (i64::from(limit) - count).max(0);
        Self {
            allowed: count <= i64::from(limit),
            limit,
            remaining: u32::try_from(remaining).unwrap_or(limit),
            reset_at: policy.window_reset_at(window_id),
        }
    }

    /// Permissive decision used while the counter store is unreachable
    pub fn fail_open(policy: &RateLimitPolicy, now: DateTime<Utc>) -> Self {
        Self {
            allowed: true,
            limit: policy.max_requests(),
            remaining: policy.max_requests(),
            reset_at: policy.window_reset_at(policy.window_id(now)),
        }
    }

    /// `X-RateLimit-Reset` value
    pub fn reset_at_unix(&self) -> i64 {
        self.reset_at.timestamp()
    }

    /// Whole seconds until the window resets, at least 1 while denied
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let secs = (self.reset_at - now).num_seconds().max(1);
        secs as u64
    }
}

/// Counter store failure
#[derive(Debug, thiserror::Error)]
pub enum CounterStoreError {
    #[error("counter store timed out after {0:?}")]
    Timeout(Duration),
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
    #[error("counter store error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Externally held counters
///
/// Only single-key atomic increment is assumed; no batch primitive.
#[trait_variant::make(CounterStore: Send)]
pub trait LocalCounterStore {
    /// Atomically increment `key` and return the new value.
    ///
    /// A key created by this call expires after `ttl`; later increments
    /// leave the expiry untouched.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, CounterStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_policy_rejects_invalid_config() {
        assert_eq!(
            RateLimitPolicy::new("api", 0, 60),
            Err(PolicyError::ZeroMaxRequests("api".into()))
        );
        assert_eq!(
            RateLimitPolicy::new("api", 10, 0),
            Err(PolicyError::ZeroWindow("api".into()))
        );
        assert_eq!(RateLimitPolicy::new("", 10, 60), Err(PolicyError::EmptyName));
    }

    #[test]
    fn test_window_id_and_reset() {
        let policy = RateLimitPolicy::new("api", 3, 60).unwrap();
        assert_eq!(policy.window_id(at(119)), 1);
        assert_eq!(policy.window_id(at(120)), 2);
        assert_eq!(policy.window_reset_at(1), at(120));
    }

    #[test]
    fn test_counter_key_includes_window() {
        let policy = RateLimitPolicy::new("write", 3, 60).unwrap();
        assert_eq!(policy.counter_key("user:u1", 42), "rl:write:user:u1:42");
        assert_ne!(
            policy.counter_key("user:u1", 42),
            policy.counter_key("user:u1", 43)
        );
    }

    #[test]
    fn test_decision_within_and_over_limit() {
        let policy = RateLimitPolicy::new("api", 3, 60).unwrap();

        let remaining: Vec<u32> = (1..=3)
            .map(|count| {
                let decision = RateLimitDecision::from_count(&policy, 0, count);
                assert!(decision.allowed);
                decision.remaining
            })
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        for count in [4, 5, 1_000] {
            let decision = RateLimitDecision::from_count(&policy, 0, count);
            assert!(!decision.allowed);
            assert_eq!(decision.remaining, 0);
            assert_eq!(decision.limit, 3);
        }
    }

    #[test]
    fn test_fail_open_reports_full_quota() {
        let policy = RateLimitPolicy::new("api", 10, 60).unwrap();
        let decision = RateLimitDecision::fail_open(&policy, at(90));
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 10);
        assert_eq!(decision.reset_at, at(120));
    }

    #[test]
    fn test_retry_after() {
        let policy = RateLimitPolicy::new("api", 1, 60).unwrap();
        let decision = RateLimitDecision::from_count(&policy, 1, 2);
        assert_eq!(decision.reset_at_unix(), 120);
        assert_eq!(decision.retry_after_secs(at(90)), 30);
        assert_eq!(decision.retry_after_secs(at(125)), 1);
    }

    struct FixedStore(i64);

    impl CounterStore for FixedStore {
        async fn increment(&self, _key: &str, _ttl: Duration) -> Result<i64, CounterStoreError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_counter_store_trait_is_usable() {
        let store = FixedStore(7);
        let value = tokio_test::block_on(CounterStore::increment(&store, "k", Duration::from_secs(1))).unwrap();
        assert_eq!(value, 7);
    }
}
