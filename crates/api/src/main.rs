//! API server entry point.

use api::config::{Config, LogFormat};
use notifications::spawn_event_log;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);
    for warning in config.warnings() {
        tracing::warn!("{warning}");
    }

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire store, bus, command handler and dispatcher
    let state = api::create_default_state(&config);
    let bus = state.orders.bus().clone();
    let intake = state
        .dispatcher
        .start(&bus)
        .await
        .expect("failed to start subscription dispatcher");

    // 4. Log every order event seen on the bus
    let listeners = CancellationToken::new();
    let event_log = spawn_event_log(&bus, listeners.clone())
        .await
        .expect("failed to subscribe event log");

    // 5. Build the application
    let app = api::create_app(state.clone(), metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(
        %addr,
        input_policy = config.input_policy.as_str(),
        transition_policy = config.transition_policy.as_str(),
        "starting API server"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    let dispatcher = state.dispatcher.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Ends every stream session so upgraded connections close too.
            dispatcher.shutdown();
        })
        .await
        .expect("server error");

    // 7. Stop background listeners
    listeners.cancel();
    bus.close();
    let _ = intake.await;
    for handle in event_log {
        let _ = handle.await;
    }

    tracing::info!("server shut down gracefully");
}
