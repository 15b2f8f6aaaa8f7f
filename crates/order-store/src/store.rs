use std::sync::Arc;

use async_trait::async_trait;
use domain::Order;

use crate::{OrderId, Result};

/// Options for saving an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Revision the caller read the order at.
    /// If None, the write is unconditional (use with caution).
    pub expected_version: Option<u64>,
}

impl SaveOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects the stored order to be at a specific revision.
    pub fn expect_version(version: u64) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Expects no order to be stored under the id yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(0),
        }
    }
}

/// Key-value persistence for orders.
///
/// Implementations must be thread-safe and make `save` an atomic
/// compare-and-set against `SaveOptions::expected_version`, so two
/// read-modify-write cycles on the same order cannot both succeed.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores the order and returns it stamped with its new revision.
    ///
    /// Fails with `AlreadyExists` if a new order was expected but one is
    /// stored, or `ConcurrencyConflict` if the stored revision differs from
    /// `options.expected_version`.
    async fn save(&self, order: Order, options: SaveOptions) -> Result<Order>;

    /// Loads the latest stored copy of an order.
    ///
    /// Fails with `NotFound` if the id is unknown.
    async fn get(&self, id: OrderId) -> Result<Order>;
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    async fn save(&self, order: Order, options: SaveOptions) -> Result<Order> {
        (**self).save(order, options).await
    }

    async fn get(&self, id: OrderId) -> Result<Order> {
        (**self).get(id).await
    }
}
