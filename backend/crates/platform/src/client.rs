//! Client identification utilities
//!
//! Works out who an anonymous caller is without ever keeping their IP.

use axum::http::HeaderMap;
use std::net::IpAddr;

use crate::crypto::hmac_sha256_hex;

/// Prefix for subject keys derived from an IP hash
pub const ANONYMOUS_PREFIX: &str = "anon:";

/// Hex characters of the keyed hash kept in an anonymous id
const ANONYMOUS_HASH_LEN: usize = 32;

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

/// Privacy-preserving id for an unauthenticated caller
///
/// Keyed hash (HMAC-SHA256 under a server-side salt) of the IP, so the
/// raw address cannot be recovered from counter keys or logs. Callers
/// with no determinable IP share the `unknown` bucket.
pub fn anonymous_client_id(ip: Option<IpAddr>, salt: &[u8]) -> String {
    let source = ip.map(|ip| ip.to_string());
    let source = source.as_deref().unwrap_or("unknown");
    let digest = hmac_sha256_hex(salt, source.as_bytes());
    format!("{ANONYMOUS_PREFIX}{}", &digest[..ANONYMOUS_HASH_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_ignores_garbage_xff() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(direct)), Some(direct));
    }

    #[test]
    fn test_anonymous_id_never_contains_ip() {
        let ip: IpAddr = "203.0.113.7".parse().unwrap();
        let id = anonymous_client_id(Some(ip), b"salt");

        assert!(id.starts_with(ANONYMOUS_PREFIX));
        assert_eq!(id.len(), ANONYMOUS_PREFIX.len() + ANONYMOUS_HASH_LEN);
        assert!(!id.contains("203.0.113.7"));
    }

    #[test]
    fn test_anonymous_id_is_stable_per_salt() {
        let ip: IpAddr = "2001:db8::1".parse().unwrap();
        assert_eq!(
            anonymous_client_id(Some(ip), b"salt-a"),
            anonymous_client_id(Some(ip), b"salt-a")
        );
        assert_ne!(
            anonymous_client_id(Some(ip), b"salt-a"),
            anonymous_client_id(Some(ip), b"salt-b")
        );
        assert_ne!(
            anonymous_client_id(Some(ip), b"salt-a"),
            anonymous_client_id(None, b"salt-a")
        );
    }
}
