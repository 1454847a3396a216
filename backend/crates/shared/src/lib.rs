//! Shared Kernel - vocabulary every backend crate agrees on
//!
//! - Unified error type ([`error::app_error::AppError`]) and its HTTP kinds
//! - Typed entity IDs
//! - The caller [`identity::Identity`] resolved by the session service
//!
//! Only things with the same meaning across rate limiting, webhooks and
//! the route layer belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
pub mod identity;
