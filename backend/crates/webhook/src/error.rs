//! Webhook Error Types
//!
//! Webhook-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::entities::DeliveryAttempt;

pub type WebhookResult<T> = Result<T, WebhookError>;

#[derive(Debug, Error)]
pub enum WebhookError {
    /// Target URL does not parse or is not http(s)
    #[error("Invalid webhook URL: {0}")]
    InvalidUrl(String),

    /// Webhook has no signing secret
    #[error("Webhook signing secret is missing")]
    MissingSecret,

    /// Event name cannot be sent as a header value
    #[error("Invalid event name: {0}")]
    InvalidEvent(String),

    #[error("Webhook not found")]
    WebhookNotFound,

    #[error("Webhook is inactive")]
    WebhookInactive,

    /// Caller lacks the role for this operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Every attempt failed
    #[error("Webhook delivery failed after {} attempts", .attempts.len())]
    DeliveryFailed { attempts: Vec<DeliveryAttempt> },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidUrl(_)
            | WebhookError::MissingSecret
            | WebhookError::InvalidEvent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WebhookError::WebhookNotFound => StatusCode::NOT_FOUND,
            WebhookError::WebhookInactive => StatusCode::CONFLICT,
            WebhookError::Forbidden(_) => StatusCode::FORBIDDEN,
            WebhookError::DeliveryFailed { .. } => StatusCode::BAD_GATEWAY,
            WebhookError::Serialization(_)
            | WebhookError::Database(_)
            | WebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WebhookError::InvalidUrl(_)
            | WebhookError::MissingSecret
            | WebhookError::InvalidEvent(_) => ErrorKind::UnprocessableEntity,
            WebhookError::WebhookNotFound => ErrorKind::NotFound,
            WebhookError::WebhookInactive => ErrorKind::Conflict,
            WebhookError::Forbidden(_) => ErrorKind::Forbidden,
            WebhookError::DeliveryFailed { .. } => ErrorKind::BadGateway,
            WebhookError::Serialization(_)
            | WebhookError::Database(_)
            | WebhookError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    fn log(&self) {
        match self {
            WebhookError::Database(e) => {
                tracing::error!(error = %e, "Webhook database error");
            }
            WebhookError::Internal(msg) => {
                tracing::error!(message = %msg, "Webhook internal error");
            }
            WebhookError::DeliveryFailed { attempts } => {
                tracing::warn!(attempts = attempts.len(), "Webhook delivery failed");
            }
            _ => {
                tracing::debug!(error = %self, "Webhook error");
            }
        }
    }
}

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        AppError::new(err.kind(), err.to_string())
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
