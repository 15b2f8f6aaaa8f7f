//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use message_bus::MessageBus;
use order_store::OrderStore;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub stream_sessions: usize,
}

/// GET /health: reports liveness and the number of attached stream sessions.
pub async fn check<S, B>(State(state): State<Arc<AppState<S, B>>>) -> Json<HealthResponse>
where
    S: OrderStore + 'static,
    B: MessageBus + 'static,
{
    let status = if state.dispatcher.is_shut_down() {
        "shutting_down"
    } else {
        "ok"
    };
    Json(HealthResponse {
        status,
        stream_sessions: state.dispatcher.session_count(),
    })
}
