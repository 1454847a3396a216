//! Application Configuration
//!
//! Configuration for the rate limiting application layer.

use platform::crypto::random_bytes;
use platform::rate_limit::PolicyError;
use std::time::Duration;

use crate::domain::policy::PolicyCatalog;

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Named policies by plan tier
    pub catalog: PolicyCatalog,
    /// Key for hashing anonymous client IPs
    pub anonymous_salt: Vec<u8>,
    /// Upper bound on one counter store round-trip before failing open
    pub store_timeout: Duration,
}

impl RateLimitConfig {
    pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(500);

    pub fn new(catalog: PolicyCatalog, anonymous_salt: Vec<u8>) -> Self {
        Self {
            catalog,
            anonymous_salt,
            store_timeout: Self::DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Standard catalog with a random per-process salt (for development)
    pub fn development() -> Result<Self, PolicyError> {
        Ok(Self::new(PolicyCatalog::standard()?, random_bytes(32)))
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}
