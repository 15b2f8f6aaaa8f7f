//! WebSocket stream of status updates for one order.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use domain::OrderUpdated;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use message_bus::MessageBus;
use notifications::{SessionEnd, StreamSession, Transport, TransportError};
use order_store::OrderStore;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::orders::parse_order_id;

/// A WebSocket connection carrying JSON-encoded `OrderUpdated` text frames.
///
/// Inbound frames are ignored; a close frame or read error counts as disconnect.
pub struct WsTransport {
    sink: SplitSink<WebSocket, Message>,
    stream: SplitStream<WebSocket>,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self { sink, stream }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, update: &OrderUpdated) -> Result<(), TransportError> {
        let json =
            serde_json::to_string(update).map_err(|e| TransportError::Encode(e.to_string()))?;
        self.sink
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn closed(&mut self) {
        while let Some(Ok(message)) = self.stream.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}

/// GET /streams/orders/{id}: upgrade to a WebSocket and push every later update of the order.
///
/// The session is attached before the upgrade completes, so no update
/// published after the handshake response is missed.
#[tracing::instrument(skip(state, ws))]
pub async fn subscribe<S, B>(
    State(state): State<Arc<AppState<S, B>>>,
    Path(id): Path<String>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError>
where
    S: OrderStore + 'static,
    B: MessageBus + 'static,
{
    let order_id = parse_order_id(&id)?;
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let subscription = state.dispatcher.attach(order_id)?;
    tracing::info!(subscription_id = %subscription.id(), "stream session attached");

    Ok(ws.on_upgrade(move |socket| async move {
        let end = StreamSession::new(subscription, WsTransport::new(socket))
            .run()
            .await;
        let reason = match end {
            SessionEnd::Disconnected => "disconnected",
            SessionEnd::TransportFailed(_) => "transport_failed",
            SessionEnd::FeedClosed => "feed_closed",
        };
        metrics::counter!("stream_sessions_ended_total", "reason" => reason).increment(1);
    }))
}
