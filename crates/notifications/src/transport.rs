//! Outbound connection abstraction for stream sessions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use domain::OrderUpdated;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::TransportError;

/// A per-client connection that updates are written to.
///
/// Implemented by the WebSocket handler in the API crate and by
/// [`ChannelTransport`] for tests.
#[async_trait]
pub trait Transport: Send {
    /// Writes one update to the client.
    async fn send(&mut self, update: &OrderUpdated) -> Result<(), TransportError>;

    /// Resolves once the client has gone away. Must be cancel-safe.
    async fn closed(&mut self);

    /// Closes the connection from the server side.
    async fn close(&mut self);
}

#[derive(Default)]
struct Shared {
    fail_sends: AtomicBool,
    server_closed: AtomicBool,
}

/// In-process transport backed by a channel.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<OrderUpdated>,
    disconnect: CancellationToken,
    shared: Arc<Shared>,
}

/// The client end of a [`ChannelTransport`].
pub struct TransportProbe {
    rx: mpsc::UnboundedReceiver<OrderUpdated>,
    disconnect: CancellationToken,
    shared: Arc<Shared>,
}

impl ChannelTransport {
    pub fn pair() -> (ChannelTransport, TransportProbe) {
        let (tx, rx) = mpsc::unbounded_channel();
        let disconnect = CancellationToken::new();
        let shared = Arc::new(Shared::default());

        (
            ChannelTransport {
                tx,
                disconnect: disconnect.clone(),
                shared: Arc::clone(&shared),
            },
            TransportProbe {
                rx,
                disconnect,
                shared,
            },
        )
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, update: &OrderUpdated) -> Result<(), TransportError> {
        if self.disconnect.is_cancelled() {
            return Err(TransportError::Closed);
        }
        if self.shared.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Send("write failed".to_string()));
        }
        self.tx
            .send(update.clone())
            .map_err(|_| TransportError::Closed)
    }

    async fn closed(&mut self) {
        tokio::select! {
            _ = self.disconnect.cancelled() => {}
            _ = self.tx.closed() => {}
        }
    }

    async fn close(&mut self) {
        self.shared.server_closed.store(true, Ordering::SeqCst);
    }
}

impl TransportProbe {
    /// Waits for the next update written to the transport.
    ///
    /// Returns None once the transport has been dropped.
    pub async fn recv(&mut self) -> Option<OrderUpdated> {
        self.rx.recv().await
    }

    /// Returns an update already written, without waiting.
    pub fn try_recv(&mut self) -> Option<OrderUpdated> {
        self.rx.try_recv().ok()
    }

    /// Simulates the client hanging up.
    pub fn disconnect(&self) {
        self.disconnect.cancel();
    }

    /// Makes every later send fail with a write error.
    pub fn fail_sends(&self, fail: bool) {
        self.shared.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Returns true once the server side has closed the connection.
    pub fn is_closed_by_server(&self) -> bool {
        self.shared.server_closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{OrderId, UserId};
    use domain::OrderStatus;
    use std::time::Duration;

    fn update() -> OrderUpdated {
        OrderUpdated {
            order_id: OrderId::new(),
            user_id: UserId::from("user-1"),
            status: OrderStatus::InTransit,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn sends_reach_the_probe() {
        let (mut transport, mut probe) = ChannelTransport::pair();
        let sent = update();
        transport.send(&sent).await.unwrap();
        assert_eq!(probe.recv().await.unwrap(), sent);
    }

    #[tokio::test]
    async fn disconnect_resolves_closed_and_fails_sends() {
        let (mut transport, probe) = ChannelTransport::pair();
        probe.disconnect();

        tokio::time::timeout(Duration::from_secs(1), transport.closed())
            .await
            .unwrap();
        assert_eq!(transport.send(&update()).await, Err(TransportError::Closed));
    }

    #[tokio::test]
    async fn dropping_probe_resolves_closed() {
        let (mut transport, probe) = ChannelTransport::pair();
        drop(probe);
        tokio::time::timeout(Duration::from_secs(1), transport.closed())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failing_sends_surface_send_error() {
        let (mut transport, probe) = ChannelTransport::pair();
        probe.fail_sends(true);
        assert!(matches!(
            transport.send(&update()).await,
            Err(TransportError::Send(_))
        ));
    }

    #[tokio::test]
    async fn close_is_visible_to_probe() {
        let (mut transport, probe) = ChannelTransport::pair();
        assert!(!probe.is_closed_by_server());
        transport.close().await;
        assert!(probe.is_closed_by_server());
    }
}
