//! Transport configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the chat transports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetConfig {
    /// Base URL of the admin API, including the `/api` prefix.
    pub api_base_url: String,

    /// WebSocket endpoint of the push channel.
    pub push_url: String,

    /// Per-request timeout for REST calls (seconds).
    pub request_timeout_secs: u64,

    /// First reconnect delay; doubled on every failed attempt.
    pub reconnect_base_delay_ms: u64,

    /// Upper bound for the reconnect delay.
    pub reconnect_max_delay_ms: u64,

    /// Give up after this many failed reconnects. `None` retries forever.
    pub max_reconnect_attempts: Option<u32>,

    /// Sent as `Authorization: Bearer <token>` on REST calls and the
    /// WebSocket handshake.
    pub bearer_token: Option<String>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3002/api".to_string(),
            push_url: "ws://localhost:3002/ws".to_string(),
            request_timeout_secs: 30,
            reconnect_base_delay_ms: 500,
            reconnect_max_delay_ms: 30_000,
            max_reconnect_attempts: Some(10),
            bearer_token: None,
        }
    }
}

impl NetConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delay before reconnect attempt `attempt` (zero-based).
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(20);
        let ms = self
            .reconnect_base_delay_ms
            .saturating_mul(factor)
            .min(self.reconnect_max_delay_ms);
        Duration::from_millis(ms)
    }
}
