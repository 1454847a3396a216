//! Infrastructure Layer - External implementations

pub mod http;
pub mod memory;
pub mod postgres;
