//! Shared types for the back-office chat.
//!
//! - Opaque identifiers issued by the chat transport service
//! - The in-memory chat model (`Message`, `Conversation`)
//! - Inbound push events and outbound push frames
//! - Wire records of the transport service and their conversion into the model

pub mod conversation;
pub mod event;
pub mod ids;
pub mod message;
pub mod wire;

pub use conversation::{Conversation, ConversationHistory, Operator, PeerDisplay};
pub use event::{ChatEvent, OutboundFrame, OutboundMessage};
pub use ids::{ConversationId, MessageId, UserId};
pub use message::Message;
pub use wire::WireError;
