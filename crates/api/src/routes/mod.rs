//! HTTP and WebSocket route handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod streams;
