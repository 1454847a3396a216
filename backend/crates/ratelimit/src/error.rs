//! Rate Limit Error Types
//!
//! Rate-limit-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::rate_limit::{PolicyError, RateLimitDecision};
use thiserror::Error;

use crate::presentation::headers::apply_rate_limit_headers;

pub type RateLimitResult<T> = Result<T, RateLimitError>;

#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Quota for the current window is used up
    #[error("Rate limit exceeded")]
    Exceeded(RateLimitDecision),

    /// Policy configuration rejected at startup
    #[error("Invalid rate limit policy: {0}")]
    InvalidPolicy(#[from] PolicyError),

    /// Database error (maintenance paths only; checks fail open)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RateLimitError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RateLimitError::Exceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            RateLimitError::InvalidPolicy(_) | RateLimitError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RateLimitError::Exceeded(_) => ErrorKind::TooManyRequests,
            RateLimitError::InvalidPolicy(_) | RateLimitError::Database(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    fn log(&self) {
        match self {
            RateLimitError::Exceeded(decision) => {
                tracing::debug!(limit = decision.limit, "Rejecting rate limited request");
            }
            RateLimitError::InvalidPolicy(e) => {
                tracing::error!(error = %e, "Invalid rate limit policy");
            }
            RateLimitError::Database(e) => {
                tracing::error!(error = %e, "Rate limit database error");
            }
        }
    }
}

impl From<RateLimitError> for AppError {
    fn from(err: RateLimitError) -> Self {
        let app_err = AppError::new(err.kind(), err.to_string());
        match &err {
            RateLimitError::Exceeded(decision) => app_err.with_action(format!(
                "Retry after {} seconds",
                decision.retry_after_secs(Utc::now())
            )),
            _ => app_err,
        }
    }
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        self.log();
        let decision = match &self {
            RateLimitError::Exceeded(decision) => Some(decision.clone()),
            _ => None,
        };

        let mut response = AppError::from(self).into_response();

        if let Some(decision) = decision {
            let headers = response.headers_mut();
            apply_rate_limit_headers(headers, &decision);
            headers.insert(
                axum::http::header::RETRY_AFTER,
                decision.retry_after_secs(Utc::now()).into(),
            );
        }

        response
    }
}
