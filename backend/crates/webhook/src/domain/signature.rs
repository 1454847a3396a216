//! Webhook Signing
//!
//! `X-Webhook-Signature: sha256=<hex hmac-sha256(secret, body)>`

use platform::crypto::{constant_time_eq, hmac_sha256_hex};

pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Signature header value for `body`
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    format!(
        "{SIGNATURE_PREFIX}{}",
        hmac_sha256_hex(secret.as_bytes(), body)
    )
}

/// Check a received signature header against `body`
pub fn verify_signature(secret: &str, body: &[u8], header: &str) -> bool {
    let expected = sign_body(secret, body);
    constant_time_eq(expected.as_bytes(), header.trim().as_bytes())
}
