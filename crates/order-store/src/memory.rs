use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use domain::Order;
use tokio::sync::RwLock;

use crate::{
    OrderId, Result, StoreError,
    store::{OrderStore, SaveOptions},
};

/// In-memory order store.
///
/// Cloning shares the underlying map. Writes are serialized by a single
/// lock, which makes every `save` an atomic check-then-set.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Removes every stored order.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, mut order: Order, options: SaveOptions) -> Result<Order> {
        self.check_available()?;

        let order_id = order.id();
        let mut orders = self.orders.write().await;

        let current = orders.get(&order_id).map(Order::version).unwrap_or(0);
        if let Some(expected) = options.expected_version
            && expected != current
        {
            if expected == 0 {
                return Err(StoreError::AlreadyExists(order_id));
            }
            return Err(StoreError::ConcurrencyConflict {
                order_id,
                expected,
                actual: current,
            });
        }

        order.set_version(current + 1);
        orders.insert(order_id, order.clone());
        tracing::debug!(%order_id, version = current + 1, "order saved");

        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Order> {
        self.check_available()?;

        self.orders
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
}
