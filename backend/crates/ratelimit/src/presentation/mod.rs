//! Presentation Layer - HTTP middleware and headers

pub mod headers;
pub mod middleware;
