//! Network transports for the back-office live chat.
//!
//! - `AdminRestClient`: bearer-token JSON client for the admin API
//! - `HttpChatApi`: the chat pull API on top of it
//! - `WsPushChannel`: WebSocket push channel with reconnect

pub mod api_client;
pub mod config;
pub mod error;
pub mod push_channel;
pub mod rest_client;

pub use api_client::HttpChatApi;
pub use config::NetConfig;
pub use error::{NetError, NetResult};
pub use push_channel::WsPushChannel;
pub use rest_client::AdminRestClient;
