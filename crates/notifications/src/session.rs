//! Per-connection streaming session.

use tokio::time::Instant;

use crate::{Subscription, Transport, TransportError};

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client went away.
    Disconnected,
    /// Writing to the client failed.
    TransportFailed(TransportError),
    /// The dispatcher dropped the subscription (shutdown or eviction).
    FeedClosed,
}

/// Streams one order's updates to one client until either side stops.
///
/// Owns its [`Subscription`], so ending the session for any reason
/// deregisters it from the dispatcher and affects no other session.
pub struct StreamSession<T: Transport> {
    subscription: Subscription,
    transport: T,
}

impl<T: Transport> StreamSession<T> {
    pub fn new(subscription: Subscription, transport: T) -> Self {
        Self {
            subscription,
            transport,
        }
    }

    /// Forwards updates in arrival order and returns how the session ended.
    #[tracing::instrument(
        skip(self),
        fields(order_id = %self.subscription.order_id(), subscription_id = %self.subscription.id())
    )]
    pub async fn run(self) -> SessionEnd {
        let Self {
            mut subscription,
            mut transport,
        } = self;
        let order_id = subscription.order_id();
        let started = Instant::now();
        let mut forwarded = 0u64;

        let end = loop {
            tokio::select! {
                _ = transport.closed() => break SessionEnd::Disconnected,
                next = subscription.recv() => {
                    let Some(update) = next else {
                        break SessionEnd::FeedClosed;
                    };
                    if update.order_id != order_id {
                        continue;
                    }
                    if let Err(err) = transport.send(&update).await {
                        break match err {
                            TransportError::Closed => SessionEnd::Disconnected,
                            other => SessionEnd::TransportFailed(other),
                        };
                    }
                    forwarded += 1;
                }
            }
        };

        drop(subscription);
        transport.close().await;

        match &end {
            SessionEnd::TransportFailed(err) => {
                tracing::warn!(error = %err, forwarded, "stream session failed")
            }
            _ => tracing::info!(
                ?end,
                forwarded,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "stream session ended"
            ),
        }

        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelTransport, SubscriptionDispatcher};
    use chrono::Utc;
    use common::{OrderId, UserId};
    use domain::{OrderStatus, OrderUpdated};

    fn update(order_id: OrderId, status: OrderStatus) -> OrderUpdated {
        OrderUpdated {
            order_id,
            user_id: UserId::from("user-1"),
            status,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn forwards_updates_then_ends_on_disconnect() {
        let dispatcher = SubscriptionDispatcher::default();
        let id = OrderId::new();
        let (transport, mut probe) = ChannelTransport::pair();
        let session = StreamSession::new(dispatcher.attach(id).unwrap(), transport);
        let handle = tokio::spawn(session.run());

        dispatcher.dispatch(&update(id, OrderStatus::InTransit));
        assert_eq!(probe.recv().await.unwrap().status, OrderStatus::InTransit);

        probe.disconnect();
        assert_eq!(handle.await.unwrap(), SessionEnd::Disconnected);
        assert_eq!(dispatcher.listener_count(id), 0);
        assert!(probe.is_closed_by_server());
    }

    #[tokio::test]
    async fn transport_failure_ends_session() {
        let dispatcher = SubscriptionDispatcher::default();
        let id = OrderId::new();
        let (transport, probe) = ChannelTransport::pair();
        probe.fail_sends(true);
        let handle = tokio::spawn(StreamSession::new(dispatcher.attach(id).unwrap(), transport).run());

        dispatcher.dispatch(&update(id, OrderStatus::Delivered));

        assert!(matches!(
            handle.await.unwrap(),
            SessionEnd::TransportFailed(TransportError::Send(_))
        ));
        assert_eq!(dispatcher.session_count(), 0);
    }

    #[tokio::test]
    async fn dispatcher_shutdown_ends_session_with_feed_closed() {
        let dispatcher = SubscriptionDispatcher::default();
        let (transport, _probe) = ChannelTransport::pair();
        let handle =
            tokio::spawn(StreamSession::new(dispatcher.attach(OrderId::new()).unwrap(), transport).run());

        dispatcher.shutdown();
        assert_eq!(handle.await.unwrap(), SessionEnd::FeedClosed);
    }
}
