//! Error types for the image cache client
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Client Error Enum ==
/// Error returned by image requests.
///
/// Callers should treat `Unavailable` as potentially retryable upstream and
/// `Protocol` as a hard failure for that request.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Every replica failed for the configured number of rounds
    #[error("All replicas unavailable for image {id} after {attempts} attempts")]
    Unavailable { id: String, attempts: u32 },

    /// Backend answered with something that cannot be an image
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Local fixture could not be read (offline mode)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Returns true for failures that exhausted every replica.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ClientError::Unavailable { .. })
    }

    /// Returns true for non-retryable protocol failures.
    pub fn is_protocol(&self) -> bool {
        matches!(self, ClientError::Protocol(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let status = match &self {
            ClientError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ClientError::Protocol(_) => StatusCode::BAD_GATEWAY,
            ClientError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                StatusCode::NOT_FOUND
            }
            ClientError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ClientError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ClientError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Listener Error Enum ==
/// Terminal failure of a single invalidation listener.
#[derive(Error, Debug)]
pub enum ListenerError {
    /// Could not open the event stream
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    /// Event stream answered with a non-success status
    #[error("Event stream at {address} returned status {status}")]
    Status { address: String, status: u16 },

    /// Event stream broke while reading
    #[error("Event stream at {address} failed: {source}")]
    Stream {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    /// Event stream closed by the backend
    #[error("Event stream at {0} closed")]
    Closed(String),

    /// Gave up reconnecting
    #[error("Max reconnection attempts reached for {0}")]
    MaxReconnectAttempts(String),

    /// Listener task panicked or was aborted
    #[error("Listener task for {address} did not finish cleanly: {reason}")]
    Task { address: String, reason: String },
}

// == Result Type Alias ==
/// Convenience Result type for the image cache client.
pub type Result<T> = std::result::Result<T, ClientError>;
