//! Order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use commands::{IssueOrder, UpdateOrderStatus};
pub use events::{EventKind, OrderEvent, OrderIssued, OrderUpdated};
pub use state::{OrderStatus, TransitionPolicy};
pub use value_objects::{InputPolicy, Money, Pricing, transaction_fee_rate};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// User ID is required.
    #[error("User ID is required")]
    UserIdRequired,

    /// A numeric field could not be parsed.
    #[error("Invalid {field}: {value:?} is not a valid number")]
    InvalidNumber { field: &'static str, value: String },

    /// A numeric field was negative.
    #[error("Invalid {field}: must not be negative")]
    NegativeAmount { field: &'static str },

    /// The requested status is not one of the known statuses.
    #[error("Unknown order status: {0:?}")]
    UnknownStatus(String),

    /// The transition policy does not allow this status change.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },
}
