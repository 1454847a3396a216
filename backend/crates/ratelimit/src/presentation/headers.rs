//! `X-RateLimit-*` response headers

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use platform::rate_limit::RateLimitDecision;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Write limit, remaining and reset (unix seconds) from a decision
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_at_unix()));
}

/// Like [`apply_rate_limit_headers`], but keeps headers an inner limiter
/// already wrote when they leave no more quota than `decision`.
///
/// Stacked limiters then report the most restrictive policy, and a 429
/// from an inner limiter keeps the headers that match its `Retry-After`.
pub fn apply_stricter_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    let inner_remaining = headers
        .get(&X_RATELIMIT_REMAINING)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u32>().ok());

    match inner_remaining {
        Some(remaining) if remaining <= decision.remaining => {}
        _ => apply_rate_limit_headers(headers, decision),
    }
}
