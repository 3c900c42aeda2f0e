//! Chat session configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How an outbound message reaches the authoritative log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Show immediately, emit on the push channel, merge the broadcast echo.
    OptimisticFirst,
    /// Show immediately, persist over REST, merge the REST response, then
    /// emit on the push channel. The later broadcast collapses by id.
    ConfirmFirst,
}

/// Configuration for a chat session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatConfig {
    pub delivery_mode: DeliveryMode,

    /// Max distance between a local echo and its server copy for them to be
    /// merged. `None` matches on content, sender and conversation only.
    pub echo_window_secs: Option<u64>,

    /// Pull the directory again when a message arrives for a conversation
    /// the directory does not know yet.
    pub refresh_on_unknown_conversation: bool,

    /// Capacity of the command channel from handles to the session.
    pub command_buffer: usize,

    /// Capacity of the update channel from the session to the UI.
    pub update_buffer: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            delivery_mode: DeliveryMode::OptimisticFirst,
            echo_window_secs: Some(300),
            refresh_on_unknown_conversation: true,
            command_buffer: 32,
            update_buffer: 64,
        }
    }
}

impl ChatConfig {
    pub fn echo_window(&self) -> Option<Duration> {
        self.echo_window_secs.map(Duration::from_secs)
    }
}
