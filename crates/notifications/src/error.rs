//! Notification error types.

use thiserror::Error;

/// Errors raised by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Subscribing to the bus failed.
    #[error("Bus error: {0}")]
    Bus(#[from] message_bus::BusError),

    /// The dispatcher has been shut down and accepts no new sessions.
    #[error("Dispatcher is shut down")]
    ShutDown,
}

/// Errors raised by a streaming transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The peer is gone.
    #[error("Connection closed")]
    Closed,

    /// Writing to the connection failed.
    #[error("Send failed: {0}")]
    Send(String),

    /// The update could not be encoded for the wire.
    #[error("Encoding failed: {0}")]
    Encode(String),
}
