//! Server configuration from environment variables

use anyhow::{Context, bail};
use axum::http::HeaderValue;
use platform::crypto::{from_base64, random_bytes};
use ratelimit::{PolicyCatalog, RateLimitConfig};
use std::fmt::Display;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::time::Duration;
use webhook::{RetryPolicy, WebhookConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
const IP_SALT_LEN: usize = 32;

const STORE_TIMEOUT_MS: RangeInclusive<u64> = 10..=10_000;
const WEBHOOK_TIMEOUT_SECS: RangeInclusive<u64> = 1..=120;
const WEBHOOK_ATTEMPTS: RangeInclusive<u32> = 1..=RetryPolicy::MAX_ATTEMPTS;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<HeaderValue>,
    /// Without it every caller is anonymous
    pub identity_service_url: Option<String>,
    pub rate_limit: RateLimitConfig,
    pub webhook: WebhookConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), cfg!(debug_assertions))
    }

    /// `development` allows a random IP salt when none is configured
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        development: bool,
    ) -> anyhow::Result<Self> {
        let database_url =
            lookup("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let frontend_origins = lookup("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();

        let identity_service_url = lookup("IDENTITY_SERVICE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let anonymous_salt = match lookup("RATE_LIMIT_IP_SALT") {
            Some(encoded) => {
                let salt =
                    from_base64(encoded.trim()).context("RATE_LIMIT_IP_SALT must be base64")?;
                if salt.len() != IP_SALT_LEN {
                    bail!("RATE_LIMIT_IP_SALT must decode to {IP_SALT_LEN} bytes");
                }
                salt
            }
            None if development => random_bytes(IP_SALT_LEN),
            None => bail!("RATE_LIMIT_IP_SALT must be set in production"),
        };

        let store_timeout_ms =
            parse_in(&lookup, "RATE_LIMIT_STORE_TIMEOUT_MS", 500u64, STORE_TIMEOUT_MS)?;
        let rate_limit = RateLimitConfig::new(PolicyCatalog::standard()?, anonymous_salt)
            .with_store_timeout(Duration::from_millis(store_timeout_ms));

        let defaults = WebhookConfig::default();
        let timeout_secs = parse_in(&lookup, "WEBHOOK_TIMEOUT_SECS", 10u64, WEBHOOK_TIMEOUT_SECS)?;
        let max_attempts = parse_in(
            &lookup,
            "WEBHOOK_MAX_ATTEMPTS",
            defaults.retry.max_attempts,
            WEBHOOK_ATTEMPTS,
        )?;
        let webhook = defaults
            .clone()
            .with_retry(RetryPolicy::new(
                max_attempts,
                defaults.retry.base_delay,
                defaults.retry.max_delay,
            ))
            .with_request_timeout(Duration::from_secs(timeout_secs));

        Ok(Self {
            database_url,
            bind_addr,
            frontend_origins,
            identity_service_url,
            rate_limit,
            webhook,
        })
    }
}

/// Parse `key` if set, rejecting values outside `range`
fn parse_in<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    range: RangeInclusive<T>,
) -> anyhow::Result<T>
where
    T: std::str::FromStr + PartialOrd + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let value: T = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: {raw}"))?;
    if !range.contains(&value) {
        bail!(
            "{key} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        );
    }
    Ok(value)
}
