//! Rate Limit Middleware

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::identity::Identity;
use platform::client::extract_client_ip;
use platform::rate_limit::CounterStore;
use std::net::SocketAddr;

use crate::application::check::RateLimiter;
use crate::domain::subject::Subject;
use crate::error::RateLimitError;
use crate::presentation::headers::apply_stricter_rate_limit_headers;

/// Middleware state: the limiter plus the policy this route group uses
pub struct RateLimitState<S>
where
    S: CounterStore + Send + Sync + 'static,
{
    pub limiter: RateLimiter<S>,
    pub policy: &'static str,
}

impl<S> RateLimitState<S>
where
    S: CounterStore + Send + Sync + 'static,
{
    pub fn new(limiter: RateLimiter<S>, policy: &'static str) -> Self {
        Self { limiter, policy }
    }
}

impl<S> Clone for RateLimitState<S>
where
    S: CounterStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            limiter: self.limiter.clone(),
            policy: self.policy,
        }
    }
}

/// Count the request against the state's policy
///
/// Use with `axum::middleware::from_fn_with_state`. Allowed responses get
/// `X-RateLimit-*` headers; denied requests short-circuit with 429. When
/// layers for several policies are stacked, the response reports the
/// policy with the least quota left.
pub async fn enforce_rate_limit<S>(
    State(state): State<RateLimitState<S>>,
    req: Request,
    next: Next,
) -> Response
where
    S: CounterStore + Send + Sync + 'static,
{
    let subject = resolve_subject(&req, &state.limiter.config().anonymous_salt);

    let decision = state.limiter.check_subject(&subject, state.policy).await;

    if !decision.allowed {
        return RateLimitError::Exceeded(decision).into_response();
    }

    let mut response = next.run(req).await;
    apply_stricter_rate_limit_headers(response.headers_mut(), &decision);
    response
}

/// Account subject when the identity middleware ran, anonymized IP otherwise
pub fn resolve_subject(req: &Request, anonymous_salt: &[u8]) -> Subject {
    if let Some(identity) = req.extensions().get::<Identity>() {
        return Subject::from_identity(identity);
    }

    let direct_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    let client_ip = extract_client_ip(req.headers(), direct_ip);

    Subject::anonymous(client_ip, anonymous_salt)
}
