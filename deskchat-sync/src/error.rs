//! Chat sync error types.

use thiserror::Error;

/// Result type for chat sync operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors surfaced by the chat sync engine.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message content is empty")]
    EmptyContent,

    #[error("no conversation selected")]
    NoActiveConversation,

    #[error("conversation {0} is not the active conversation")]
    NotActive(String),

    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("operation denied: {0}")]
    Forbidden(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("push channel not connected")]
    NotConnected,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("chat session not running")]
    ChannelClosed,
}

impl ChatError {
    /// Returns true for errors rejected locally before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChatError::EmptyContent | ChatError::NoActiveConversation | ChatError::NotActive(_)
        )
    }

    /// Returns true for network/server failures the operator may retry.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ChatError::Transport(_) | ChatError::Api(_) | ChatError::NotConnected
        )
    }
}
