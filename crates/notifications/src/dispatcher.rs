//! Subscription dispatcher: routes bus-delivered updates to attached sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use common::OrderId;
use domain::{EventKind, OrderEvent, OrderUpdated};
use futures_util::StreamExt;
use message_bus::{BusMessage, MessageBus, MessageStream};
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::DispatchError;

/// Identifies one attached session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Dispatcher tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Per-session queue capacity. A session that falls this far behind is evicted.
    pub session_buffer: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { session_buffer: 64 }
    }
}

type Listeners = HashMap<OrderId, HashMap<SubscriptionId, mpsc::Sender<OrderUpdated>>>;

#[derive(Default)]
struct Registry {
    listeners: Mutex<Listeners>,
    next_id: AtomicU64,
    // Only read or written while `listeners` is locked.
    closed: AtomicBool,
}

impl Registry {
    /// Returns `None` once the registry has been closed.
    fn insert(&self, order_id: OrderId, tx: mpsc::Sender<OrderUpdated>) -> Option<SubscriptionId> {
        let mut listeners = self.listeners.lock();
        if self.closed.load(Ordering::Relaxed) {
            return None;
        }
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        listeners.entry(order_id).or_default().insert(id, tx);
        metrics::gauge!("stream_sessions_active").increment(1.0);
        Some(id)
    }

    fn remove(&self, order_id: OrderId, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(for_order) = listeners.get_mut(&order_id) else {
            return false;
        };
        let removed = for_order.remove(&id).is_some();
        if for_order.is_empty() {
            listeners.remove(&order_id);
        }
        if removed {
            metrics::gauge!("stream_sessions_active").decrement(1.0);
        }
        removed
    }

    /// Drops every registration and refuses new ones.
    fn close(&self) -> usize {
        let mut listeners = self.listeners.lock();
        self.closed.store(true, Ordering::Relaxed);
        let count = listeners.values().map(HashMap::len).sum::<usize>();
        listeners.clear();
        metrics::gauge!("stream_sessions_active").decrement(count as f64);
        count
    }
}

/// A registered interest in one order's updates.
///
/// Receives every update dispatched for the order after attachment, in
/// dispatch order. Dropping it deregisters from the dispatcher.
pub struct Subscription {
    id: SubscriptionId,
    order_id: OrderId,
    rx: mpsc::Receiver<OrderUpdated>,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Waits for the next update.
    ///
    /// Returns None once the dispatcher has dropped this registration
    /// (shutdown or eviction) and the queue is drained. Cancel-safe.
    pub async fn recv(&mut self) -> Option<OrderUpdated> {
        self.rx.recv().await
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("order_id", &self.order_id)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade()
            && registry.remove(self.order_id, self.id)
        {
            tracing::debug!(subscription_id = %self.id, order_id = %self.order_id, "subscription detached");
        }
    }
}

/// Fans `OrderUpdated` events out to every session attached to the event's order.
///
/// Holds a lock-protected registry of per-session queues keyed by order id.
/// Delivery never blocks: each queue is offered the update with `try_send`,
/// and a queue that is full or closed is removed from the registry.
pub struct SubscriptionDispatcher {
    registry: Arc<Registry>,
    config: DispatcherConfig,
    shutdown: CancellationToken,
}

impl SubscriptionDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            config: DispatcherConfig {
                session_buffer: config.session_buffer.max(1),
            },
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Registers a new session for `order_id`.
    ///
    /// Only updates dispatched after this call are delivered; there is no replay.
    pub fn attach(&self, order_id: OrderId) -> Result<Subscription, DispatchError> {
        if self.shutdown.is_cancelled() {
            return Err(DispatchError::ShutDown);
        }

        let (tx, rx) = mpsc::channel(self.config.session_buffer);
        let id = self
            .registry
            .insert(order_id, tx)
            .ok_or(DispatchError::ShutDown)?;
        tracing::debug!(subscription_id = %id, %order_id, "subscription attached");

        Ok(Subscription {
            id,
            order_id,
            rx,
            registry: Arc::downgrade(&self.registry),
        })
    }

    /// Delivers an update to every session attached to its order.
    ///
    /// Returns the number of sessions the update was queued for.
    pub fn dispatch(&self, update: &OrderUpdated) -> usize {
        let mut listeners = self.registry.listeners.lock();
        let Some(for_order) = listeners.get_mut(&update.order_id) else {
            return 0;
        };

        let mut delivered = 0;
        let mut evicted = 0usize;
        for_order.retain(|id, tx| match tx.try_send(update.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(subscription_id = %id, order_id = %update.order_id, "session queue full, evicting");
                metrics::counter!("notifications_dropped_total").increment(1);
                evicted += 1;
                false
            }
            Err(TrySendError::Closed(_)) => {
                evicted += 1;
                false
            }
        });

        if for_order.is_empty() {
            listeners.remove(&update.order_id);
        }
        drop(listeners);

        if evicted > 0 {
            metrics::gauge!("stream_sessions_active").decrement(evicted as f64);
        }
        metrics::counter!("notifications_delivered_total").increment(delivered as u64);

        delivered
    }

    /// Consumes a bus subscription until it ends or the dispatcher shuts down.
    ///
    /// `OrderUpdated` events are dispatched in arrival order; other kinds are ignored.
    pub async fn run(&self, mut messages: MessageStream) {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    tracing::debug!("dispatcher intake stopped by shutdown");
                    break;
                }
                next = messages.next() => match next {
                    Some(message) => self.handle(message),
                    None => {
                        tracing::warn!("bus subscription ended, no further updates will be dispatched");
                        break;
                    }
                },
            }
        }
    }

    /// Subscribes to `OrderUpdated` on the bus and spawns the intake loop.
    pub async fn start<B: MessageBus + ?Sized>(
        self: &Arc<Self>,
        bus: &B,
    ) -> Result<JoinHandle<()>, DispatchError> {
        if self.shutdown.is_cancelled() {
            return Err(DispatchError::ShutDown);
        }

        let messages = bus.subscribe(EventKind::OrderUpdated).await?;
        let dispatcher = Arc::clone(self);
        tracing::info!("subscription dispatcher started");

        Ok(tokio::spawn(async move { dispatcher.run(messages).await }))
    }

    /// Stops the intake loop and deregisters every session.
    ///
    /// Sessions see their feed close once they have drained what was already queued.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        let drained = self.registry.close();
        tracing::info!(sessions = drained, "subscription dispatcher shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Returns the number of attached sessions across all orders.
    pub fn session_count(&self) -> usize {
        self.registry
            .listeners
            .lock()
            .values()
            .map(HashMap::len)
            .sum()
    }

    /// Returns the number of sessions attached to one order.
    pub fn listener_count(&self, order_id: OrderId) -> usize {
        self.registry
            .listeners
            .lock()
            .get(&order_id)
            .map_or(0, HashMap::len)
    }

    fn handle(&self, message: BusMessage) {
        match message.event {
            OrderEvent::OrderUpdated(update) => {
                let delivered = self.dispatch(&update);
                tracing::trace!(
                    order_id = %update.order_id,
                    message_id = %message.message_id,
                    delivered,
                    "order update dispatched"
                );
            }
            OrderEvent::OrderIssued(_) => {}
        }
    }
}

impl Default for SubscriptionDispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}
