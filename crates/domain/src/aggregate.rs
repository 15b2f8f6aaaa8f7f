//! Domain event trait.

use common::OrderId;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened to an order.
/// They are immutable and named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name used as the schema name on the bus.
    fn event_type(&self) -> &'static str;

    /// Returns the order the event is about.
    ///
    /// This is also the routing key the event is published under.
    fn order_id(&self) -> OrderId;
}
