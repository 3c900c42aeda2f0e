//! Push-channel events.

use crate::ids::{ConversationId, MessageId, UserId};
use crate::message::Message;
use serde::{Deserialize, Serialize};

/// An inbound event from the push channel, already validated.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A message was posted to a conversation.
    NewMessage(Message),
    /// A user's reaction on a message changed.
    ReactionUpdated {
        conversation_id: Option<ConversationId>,
        message_id: MessageId,
        user_id: UserId,
        emoji: String,
    },
    /// A message was withdrawn.
    MessageDeleted {
        conversation_id: Option<ConversationId>,
        message_id: MessageId,
    },
    /// Every message of a conversation was wiped server-side.
    ConversationCleared { conversation_id: ConversationId },
}

impl ChatEvent {
    /// The conversation this event is scoped to, when the server sent one.
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        match self {
            ChatEvent::NewMessage(msg) => Some(&msg.conversation_id),
            ChatEvent::ReactionUpdated {
                conversation_id, ..
            }
            | ChatEvent::MessageDeleted {
                conversation_id, ..
            } => conversation_id.as_ref(),
            ChatEvent::ConversationCleared { conversation_id } => Some(conversation_id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::NewMessage(_) => "new_message",
            ChatEvent::ReactionUpdated { .. } => "reaction_updated",
            ChatEvent::MessageDeleted { .. } => "message_deleted",
            ChatEvent::ConversationCleared { .. } => "conversation_cleared",
        }
    }
}

/// A message authored locally, as sent to the transport service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    #[serde(rename = "chatId")]
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
}

/// A frame emitted on the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    JoinConversation(ConversationId),
    SendMessage(OutboundMessage),
    React {
        conversation_id: ConversationId,
        message_id: MessageId,
        user_id: UserId,
        emoji: String,
    },
    DeleteMessage {
        conversation_id: ConversationId,
        message_id: MessageId,
    },
}
