//! Command error types.

use common::OrderId;
use domain::{Order, OrderError};
use message_bus::BusError;
use order_store::StoreError;
use thiserror::Error;

/// Errors that can occur while executing an order command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command input was rejected before anything was written.
    #[error("Validation failed: {0}")]
    Validation(#[from] OrderError),

    /// The order id is unknown. Nothing was written or published.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The store write failed. Nothing was published.
    #[error("Persistence failure: {0}")]
    Persistence(StoreError),

    /// The store write succeeded but the event could not be published.
    ///
    /// The write is not rolled back; `order` is the persisted state.
    #[error("Order {} was saved but its event could not be published: {source}", .order.id())]
    Publish {
        order: Box<Order>,
        #[source]
        source: BusError,
    },

    /// Concurrent writers kept winning the compare-and-set on this order.
    #[error("Order {0} was modified concurrently, retry the update")]
    Conflict(OrderId),
}

impl CommandError {
    /// Returns the persisted order carried by a publish failure.
    pub fn persisted_order(&self) -> Option<&Order> {
        match self {
            CommandError::Publish { order, .. } => Some(order),
            _ => None,
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => CommandError::NotFound(id),
            StoreError::ConcurrencyConflict { order_id, .. } | StoreError::AlreadyExists(order_id) => {
                CommandError::Conflict(order_id)
            }
            other => CommandError::Persistence(other),
        }
    }
}

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, CommandError>;
