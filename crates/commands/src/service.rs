//! Order service executing issue, update and get commands.

use common::{OrderId, UserId};
use domain::{DomainEvent, IssueOrder, Order, OrderEvent, UpdateOrderStatus};
use message_bus::{BusError, MessageBus};
use order_store::{OrderStore, SaveOptions, StoreError};

use crate::config::CommandConfig;
use crate::error::{CommandError, Result};

/// Service for managing orders.
///
/// Every accepted command performs exactly one durable write and then
/// publishes the resulting event keyed by order id. A failed write aborts
/// before publishing; a failed publish is reported but the write stands.
pub struct OrderService<S: OrderStore, B: MessageBus> {
    store: S,
    bus: B,
    config: CommandConfig,
}

impl<S: OrderStore, B: MessageBus> OrderService<S, B> {
    /// Creates a new order service with default policies.
    pub fn new(store: S, bus: B) -> Self {
        Self::with_config(store, bus, CommandConfig::default())
    }

    pub fn with_config(store: S, bus: B, config: CommandConfig) -> Self {
        Self { store, bus, config }
    }

    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Issues a new order and publishes `OrderIssued`.
    #[tracing::instrument(skip(self), fields(user_id = %cmd.user_id))]
    pub async fn issue(&self, cmd: IssueOrder) -> Result<Order> {
        let order = Order::issue(cmd)?;
        let event = order.issued_event();

        let order = self
            .store
            .save(order, SaveOptions::expect_new())
            .await
            .map_err(CommandError::from)?;

        metrics::counter!("orders_issued_total").increment(1);
        tracing::info!(order_id = %order.id(), net_total = %order.net_total(), "order issued");

        self.publish_or_report(order, event).await
    }

    /// Parses raw form input under the configured input policy, then issues.
    pub async fn issue_from_input(
        &self,
        user_id: impl Into<UserId>,
        total_items: &str,
        subtotal: &str,
    ) -> Result<Order> {
        let cmd = IssueOrder::parse(user_id, total_items, subtotal, self.config.input_policy)?;
        self.issue(cmd).await
    }

    /// Changes an order's status and publishes `OrderUpdated`.
    ///
    /// The read-modify-write is a compare-and-set on the stored revision;
    /// on a lost race the order is reloaded and the change re-validated.
    #[tracing::instrument(skip(self), fields(order_id = %cmd.order_id, status = %cmd.status))]
    pub async fn update_status(&self, cmd: UpdateOrderStatus) -> Result<Order> {
        let max_attempts = self.config.update_max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let mut order = self.store.get(cmd.order_id).await?;
            let read_version = order.version();

            let event = order.change_status(cmd.status, self.config.transition_policy)?;
            order.apply(&event);

            match self
                .store
                .save(order, SaveOptions::expect_version(read_version))
                .await
            {
                Ok(order) => {
                    metrics::counter!(
                        "order_status_updates_total",
                        "status" => cmd.status.as_str()
                    )
                    .increment(1);
                    tracing::info!(attempt, "order status updated");
                    return self.publish_or_report(order, event).await;
                }
                Err(StoreError::ConcurrencyConflict { .. }) if attempt < max_attempts => {
                    tracing::debug!(attempt, "lost update race, reloading order");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(CommandError::Conflict(cmd.order_id))
    }

    /// Parses a free-form status string, then updates.
    pub async fn update_status_from_input(&self, order_id: OrderId, status: &str) -> Result<Order> {
        let cmd = UpdateOrderStatus::parse(order_id, status)?;
        self.update_status(cmd).await
    }

    /// Loads an order by id.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, order_id: OrderId) -> Result<Order> {
        Ok(self.store.get(order_id).await?)
    }

    async fn publish_or_report(&self, order: Order, event: OrderEvent) -> Result<Order> {
        match self.publish(event).await {
            Ok(()) => Ok(order),
            Err(source) => {
                metrics::counter!("order_publish_failures_total").increment(1);
                tracing::error!(
                    order_id = %order.id(),
                    error = %source,
                    "event not published, store write kept"
                );
                Err(CommandError::Publish {
                    order: Box::new(order),
                    source,
                })
            }
        }
    }

    async fn publish(&self, event: OrderEvent) -> std::result::Result<(), BusError> {
        let routing_key = event.order_id().to_string();
        let max_attempts = self.config.publish_max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.bus.publish(event.clone(), &routing_key).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < max_attempts && err.is_transient() => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %err,
                        event_type = event.event_type(),
                        "publish failed, retrying"
                    );
                    tokio::time::sleep(self.config.publish_retry_delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
