//! Application Layer - Use Cases

pub mod config;
pub mod dispatcher;
pub mod publish;
