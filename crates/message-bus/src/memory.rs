use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use domain::{EventKind, OrderEvent};
use futures_util::stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::{BusError, BusMessage, MessageBus, MessageStream, Result, SchemaRegistry};

#[derive(Default)]
struct Inner {
    schemas: SchemaRegistry,
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<BusMessage>>>>,
    fail_on_publish: AtomicBool,
    closed: AtomicBool,
    published: AtomicU64,
}

/// In-process message bus.
///
/// Every subscriber gets its own unbounded queue, so a slow subscriber never
/// holds up a publisher. Cloning shares the same topics and subscribers.
#[derive(Clone, Default)]
pub struct InMemoryMessageBus {
    inner: Arc<Inner>,
}

impl InMemoryMessageBus {
    /// Creates a bus that accepts the kinds registered in `schemas`.
    pub fn new(schemas: SchemaRegistry) -> Self {
        Self {
            inner: Arc::new(Inner {
                schemas,
                ..Inner::default()
            }),
        }
    }

    /// Creates a bus bound to the default marketplace topics.
    pub fn with_default_topics() -> Self {
        Self::new(SchemaRegistry::with_default_topics())
    }

    /// Configures the bus to reject every publish.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.inner.fail_on_publish.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of messages accepted so far.
    pub fn published_count(&self) -> u64 {
        self.inner.published.load(Ordering::SeqCst)
    }

    /// Returns the number of live subscriptions for an event kind.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        let Some(topic) = self.inner.schemas.topic_for(kind) else {
            return 0;
        };
        self.inner
            .subscribers
            .lock()
            .get(topic)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Shuts the bus down. Every subscription stream ends and later calls fail.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.subscribers.lock().clear();
    }

    fn topic(&self, kind: EventKind) -> Result<&str> {
        self.inner
            .schemas
            .topic_for(kind)
            .ok_or(BusError::UnknownSchema(kind))
    }

    fn check_open(&self) -> Result<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, event: OrderEvent, routing_key: &str) -> Result<()> {
        self.check_open()?;
        let topic = self.topic(event.kind())?;

        if self.inner.fail_on_publish.load(Ordering::SeqCst) {
            return Err(BusError::Unavailable("broker unreachable".to_string()));
        }

        let message = BusMessage::new(topic, routing_key, event);
        let delivered = {
            let mut subscribers = self.inner.subscribers.lock();
            let senders = subscribers.entry(topic.to_string()).or_default();
            senders.retain(|tx| tx.send(message.clone()).is_ok());
            senders.len()
        };

        self.inner.published.fetch_add(1, Ordering::SeqCst);
        metrics::counter!("bus_messages_published_total", "topic" => topic.to_string())
            .increment(1);
        tracing::debug!(topic, routing_key, subscribers = delivered, "message published");

        Ok(())
    }

    async fn subscribe(&self, kind: EventKind) -> Result<MessageStream> {
        self.check_open()?;
        let topic = self.topic(kind)?;

        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .subscribers
            .lock()
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        tracing::debug!(topic, "subscription opened");

        let messages = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|message| (message, rx))
        });
        Ok(Box::pin(messages))
    }
}
