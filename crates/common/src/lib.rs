//! Shared identifier types used across the order notification crates.

mod types;

pub use types::{OrderId, ParseOrderIdError, UserId};
