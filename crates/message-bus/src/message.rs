use chrono::{DateTime, Utc};
use domain::{EventKind, OrderEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event as delivered by the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusMessage {
    /// Unique message id. Redeliveries of the same publish share it.
    pub message_id: Uuid,

    /// Topic the message was published on.
    pub topic: String,

    /// Partition/ordering key supplied by the publisher.
    pub routing_key: String,

    /// When the bus accepted the message.
    pub published_at: DateTime<Utc>,

    /// The domain event.
    pub event: OrderEvent,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, routing_key: impl Into<String>, event: OrderEvent) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            topic: topic.into(),
            routing_key: routing_key.into(),
            published_at: Utc::now(),
            event,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}
