//! Application Layer - Use Cases

pub mod check;
pub mod config;
