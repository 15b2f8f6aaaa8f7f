use domain::EventKind;
use thiserror::Error;

/// Errors that can occur when publishing or subscribing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// No topic is registered for this event kind.
    #[error("No schema registered for event kind {0}")]
    UnknownSchema(EventKind),

    /// The bus refused the message.
    #[error("Message rejected: {0}")]
    Rejected(String),

    /// The broker could not be reached.
    #[error("Bus unavailable: {0}")]
    Unavailable(String),

    /// The bus has been shut down.
    #[error("Bus closed")]
    Closed,
}

impl BusError {
    /// Returns true if retrying the same publish might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, BusError::Unavailable(_))
    }
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
