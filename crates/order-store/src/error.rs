use thiserror::Error;

use crate::OrderId;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No order is stored under this id.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The stored revision did not match the expected one.
    #[error(
        "Concurrency conflict for order {order_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: u64,
        actual: u64,
    },

    /// A save that expected a new order found one already stored under this id.
    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// The backing storage could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
