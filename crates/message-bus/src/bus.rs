use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{EventKind, OrderEvent};
use futures_core::Stream;

use crate::{BusMessage, Result};

/// A stream of delivered messages. It ends when the bus shuts down.
pub type MessageStream = Pin<Box<dyn Stream<Item = BusMessage> + Send>>;

/// Publish/subscribe contract for order events.
///
/// Delivery is at-least-once: subscribers may observe the same
/// `message_id` more than once and must tolerate it.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes an event on the topic registered for its kind.
    ///
    /// `routing_key` scopes ordering: messages sharing a key are delivered
    /// to each subscriber in publish order.
    async fn publish(&self, event: OrderEvent, routing_key: &str) -> Result<()>;

    /// Subscribes to every future event of the given kind.
    async fn subscribe(&self, kind: EventKind) -> Result<MessageStream>;
}

#[async_trait]
impl<T: MessageBus + ?Sized> MessageBus for Arc<T> {
    async fn publish(&self, event: OrderEvent, routing_key: &str) -> Result<()> {
        (**self).publish(event, routing_key).await
    }

    async fn subscribe(&self, kind: EventKind) -> Result<MessageStream> {
        (**self).subscribe(kind).await
    }
}
