//! Domain Layer
//!
//! - Entities (webhook record, envelope, attempts, outcome, delivery record)
//! - Retry policy (capped exponential backoff)
//! - Signing services
//! - Transport and repository traits

pub mod entities;
pub mod repository;
pub mod retry;
pub mod signature;
pub mod transport;
