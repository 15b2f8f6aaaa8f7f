//! Command side of the order notification system.
//!
//! [`OrderService`] turns issue/update commands into a durable write
//! followed by a publish of the matching domain event:
//!
//! ```text
//! command ──► validate ──► OrderStore::save ──► MessageBus::publish ──► Order
//!                              │ fails                 │ fails
//!                              ▼                       ▼
//!                     Persistence (no publish)   Publish { order } (write kept)
//! ```

pub mod config;
pub mod error;
pub mod service;

pub use config::CommandConfig;
pub use error::{CommandError, Result};
pub use service::OrderService;
