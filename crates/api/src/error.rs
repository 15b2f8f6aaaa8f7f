//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use commands::CommandError;
use domain::Order;
use notifications::DispatchError;
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client, rejected before reaching the command handler.
    BadRequest(String),
    /// The server is shutting down and accepts no new stream sessions.
    ShuttingDown,
    /// Command handler error.
    Command(CommandError),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<Order>,
}

impl ApiError {
    /// Returns the HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Command(err) => command_status(err),
        }
    }
}

fn command_status(err: &CommandError) -> StatusCode {
    match err {
        CommandError::Validation(_) => StatusCode::BAD_REQUEST,
        CommandError::NotFound(_) => StatusCode::NOT_FOUND,
        CommandError::Conflict(_) => StatusCode::CONFLICT,
        CommandError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
        CommandError::Publish { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, order) = match self {
            ApiError::BadRequest(msg) => (msg, None),
            ApiError::ShuttingDown => ("Server is shutting down".to_string(), None),
            ApiError::Command(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, "command failed");
                }
                let message = err.to_string();
                let order = match err {
                    CommandError::Publish { order, .. } => Some(*order),
                    _ => None,
                };
                (message, order)
            }
        };

        let body = ErrorBody {
            message,
            status: status.as_u16(),
            order,
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::ShutDown => ApiError::ShuttingDown,
            DispatchError::Bus(source) => {
                tracing::error!(error = %source, "stream session could not be attached");
                ApiError::ShuttingDown
            }
        }
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        ApiError::Command(err)
    }
}
