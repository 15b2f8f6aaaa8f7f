//! HTTP and WebSocket interface for the order notification system.
//!
//! Exposes order commands over form-encoded REST endpoints and pushes
//! status updates to WebSocket clients, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use commands::OrderService;
use message_bus::{InMemoryMessageBus, MessageBus};
use metrics_exporter_prometheus::PrometheusHandle;
use notifications::SubscriptionDispatcher;
use order_store::{InMemoryOrderStore, OrderStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore, B: MessageBus> {
    pub orders: OrderService<S, B>,
    pub dispatcher: Arc<SubscriptionDispatcher>,
}

impl<S: OrderStore, B: MessageBus> AppState<S, B> {
    pub fn new(orders: OrderService<S, B>, dispatcher: Arc<SubscriptionDispatcher>) -> Self {
        Self { orders, dispatcher }
    }
}

/// State wired to the in-process store and bus.
pub type InMemoryAppState = AppState<InMemoryOrderStore, InMemoryMessageBus>;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, B>(state: Arc<AppState<S, B>>, metrics_handle: PrometheusHandle) -> Router
where
    S: OrderStore + 'static,
    B: MessageBus + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S, B>))
        .route("/users/{user_id}/orders", post(routes::orders::issue::<S, B>))
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S, B>)
                .put(routes::orders::update_status::<S, B>)
                .patch(routes::orders::update_status::<S, B>),
        )
        .route(
            "/streams/orders/{id}",
            get(routes::streams::subscribe::<S, B>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state backed by a fresh in-memory store and bus.
///
/// The dispatcher is created but not started; call
/// [`SubscriptionDispatcher::start`] with the returned state's bus.
pub fn create_default_state(config: &Config) -> Arc<InMemoryAppState> {
    let store = InMemoryOrderStore::new();
    let bus = InMemoryMessageBus::with_default_topics();
    let orders = OrderService::with_config(store, bus, config.command_config());
    let dispatcher = Arc::new(SubscriptionDispatcher::new(config.dispatcher_config()));

    Arc::new(AppState::new(orders, dispatcher))
}
