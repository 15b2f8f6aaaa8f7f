//! Event kind to topic bindings.

use std::collections::HashMap;

use domain::EventKind;

/// Topic for issued orders.
pub const ORDER_ISSUED_TOPIC: &str = "org.neutrino.marketplace.event.order.issued";

/// Topic for order status updates.
pub const ORDER_UPDATED_TOPIC: &str = "org.neutrino.marketplace.event.order.updated";

/// Maps each event kind to the topic it is published on.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    topics: HashMap<EventKind, String>,
}

impl SchemaRegistry {
    /// Creates an empty registry. Publishing any kind fails until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the marketplace topics for both order events.
    pub fn with_default_topics() -> Self {
        let mut registry = Self::new();
        registry.register(EventKind::OrderIssued, ORDER_ISSUED_TOPIC);
        registry.register(EventKind::OrderUpdated, ORDER_UPDATED_TOPIC);
        registry
    }

    /// Binds an event kind to a topic, replacing any earlier binding.
    pub fn register(&mut self, kind: EventKind, topic: impl Into<String>) -> &mut Self {
        self.topics.insert(kind, topic.into());
        self
    }

    /// Returns the topic bound to `kind`.
    pub fn topic_for(&self, kind: EventKind) -> Option<&str> {
        self.topics.get(&kind).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_topics_cover_every_kind() {
        let registry = SchemaRegistry::with_default_topics();
        for kind in EventKind::ALL {
            assert!(registry.topic_for(kind).is_some());
        }
        assert_eq!(
            registry.topic_for(EventKind::OrderUpdated),
            Some(ORDER_UPDATED_TOPIC)
        );
    }

    #[test]
    fn empty_registry_has_no_topics() {
        assert!(SchemaRegistry::new().topic_for(EventKind::OrderIssued).is_none());
    }

    #[test]
    fn register_replaces_binding() {
        let mut registry = SchemaRegistry::with_default_topics();
        registry.register(EventKind::OrderIssued, "custom.issued");
        assert_eq!(registry.topic_for(EventKind::OrderIssued), Some("custom.issued"));
    }
}
