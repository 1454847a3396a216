//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations for the domain crates:
//! - Cryptographic utilities (HMAC-SHA256, Base64 decoding)
//! - Client identification (proxy-aware IP, anonymized client ids)
//! - Rate limiting primitives (policy, decision, fixed-window math, counter store trait)

pub mod client;
pub mod crypto;
pub mod rate_limit;
