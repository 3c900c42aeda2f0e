//! Collaborator seams: the pull API and the push channel of the chat
//! transport service.

use crate::error::ChatResult;
use async_trait::async_trait;
use deskchat_types::{
    ChatEvent, Conversation, ConversationHistory, ConversationId, Message, MessageId,
    OutboundFrame, OutboundMessage, UserId,
};

/// Request/response side of the chat transport service.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Lists every conversation the service knows about, with the peer
    /// display already derived relative to the operator.
    async fn list_conversations(&self) -> ChatResult<Vec<Conversation>>;

    /// Pulls one conversation with its full message history.
    async fn get_conversation(&self, id: &ConversationId) -> ChatResult<ConversationHistory>;

    /// Persists a message and returns the authoritative copy.
    async fn post_message(&self, message: &OutboundMessage) -> ChatResult<Message>;

    async fn delete_conversation(&self, id: &ConversationId) -> ChatResult<()>;

    async fn post_reaction(
        &self,
        message_id: &MessageId,
        user_id: &UserId,
        emoji: &str,
    ) -> ChatResult<()>;

    async fn delete_message(&self, message_id: &MessageId) -> ChatResult<()>;
}

/// Something the push channel reports to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A validated inbound event.
    Event(ChatEvent),
    /// The connection came back after a drop. Room membership is lost.
    Reconnected,
    /// The connection dropped; the transport may still reconnect.
    Disconnected { reason: String },
}

/// Server-push side of the chat transport service.
///
/// One connection per widget lifetime: `connect` once on start,
/// `disconnect` once on teardown.
#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn connect(&self) -> ChatResult<()>;

    async fn disconnect(&self) -> ChatResult<()>;

    fn is_connected(&self) -> bool;

    /// Emits a frame to the server.
    async fn emit(&self, frame: OutboundFrame) -> ChatResult<()>;

    /// Waits for the next inbound item. `None` means the channel is closed
    /// for good.
    async fn recv(&self) -> Option<ChannelEvent>;

    /// Subscribes to the events of one conversation.
    async fn join_conversation(&self, id: &ConversationId) -> ChatResult<()> {
        self.emit(OutboundFrame::JoinConversation(id.clone())).await
    }
}
