//! Presentation Layer - HTTP Handlers

pub mod dto;
pub mod handlers;
pub mod router;
