//! Transport error types.

use deskchat_sync::ChatError;
use deskchat_types::WireError;
use thiserror::Error;

/// Result type for transport operations.
pub type NetResult<T> = Result<T, NetError>;

/// Errors from the HTTP and WebSocket transports.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Non-2xx response. `message` comes from the `{ message }` error body.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("malformed payload: {0}")]
    Wire(#[from] WireError),

    #[error("push channel not connected")]
    NotConnected,

    #[error("configuration error: {0}")]
    Config(String),
}

impl NetError {
    /// HTTP status of an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            NetError::Api { status, .. } => Some(*status),
            NetError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<NetError> for ChatError {
    fn from(e: NetError) -> Self {
        match e {
            NetError::NotConnected => ChatError::NotConnected,
            NetError::Serialization(e) => ChatError::Serialization(e),
            NetError::Api { .. } | NetError::Wire(_) => ChatError::Api(e.to_string()),
            NetError::Http(_) | NetError::WebSocket(_) | NetError::Config(_) => {
                ChatError::Transport(e.to_string())
            }
        }
    }
}
