//! Background listener that records every order event it sees on the bus.

use domain::{EventKind, OrderEvent};
use futures_util::StreamExt;
use message_bus::{BusError, MessageBus, MessageStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Logs each message from `messages` until the stream ends or `shutdown` fires.
///
/// Returns the number of messages seen.
pub async fn log_events(mut messages: MessageStream, shutdown: CancellationToken) -> u64 {
    let mut seen = 0u64;
    loop {
        let message = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = messages.next() => match next {
                Some(message) => message,
                None => break,
            },
        };
        seen += 1;

        match &message.event {
            OrderEvent::OrderIssued(issued) => tracing::info!(
                topic = %message.topic,
                order_id = %issued.order_id,
                user_id = %issued.user_id,
                total_items = issued.total_items,
                net_total = %issued.net_total,
                "received order issued event"
            ),
            OrderEvent::OrderUpdated(updated) => tracing::info!(
                topic = %message.topic,
                order_id = %updated.order_id,
                status = %updated.status,
                "received order updated event"
            ),
        }
    }
    seen
}

/// Subscribes to every order event kind and spawns one logging task per kind.
pub async fn spawn_event_log<B: MessageBus + ?Sized>(
    bus: &B,
    shutdown: CancellationToken,
) -> Result<Vec<JoinHandle<()>>, BusError> {
    let mut handles = Vec::with_capacity(EventKind::ALL.len());
    for kind in EventKind::ALL {
        let messages = bus.subscribe(kind).await?;
        let shutdown = shutdown.clone();
        handles.push(tokio::spawn(async move {
            let seen = log_events(messages, shutdown).await;
            tracing::debug!(event_type = kind.as_str(), seen, "event log listener stopped");
        }));
    }
    Ok(handles)
}
