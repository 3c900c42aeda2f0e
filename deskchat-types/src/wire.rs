//! Wire records of the chat transport service.
//!
//! The service speaks camelCase JSON with Mongo-style `_id` keys, and its
//! payloads are loosely shaped: `sender` may be a bare id or a populated
//! user object, optional fields come back as `null`, and reactions may
//! repeat a user. The records below accept all of that and convert into
//! the model, rejecting only what cannot be placed (no conversation, no
//! sender, no message id).

use crate::conversation::{Conversation, ConversationHistory, Participant};
use crate::event::{ChatEvent, OutboundFrame};
use crate::ids::{ConversationId, MessageId, UserId};
use crate::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Push-channel event names.
pub mod event_names {
    pub const NEW_MESSAGE: &str = "new message";
    pub const REACTION_UPDATED: &str = "reaction updated";
    pub const MESSAGE_DELETED: &str = "message deleted";
    pub const CONVERSATION_CLEARED: &str = "chat messages cleared";
    pub const JOIN_CONVERSATION: &str = "join chat";
    pub const SEND_MESSAGE: &str = "send message";
    pub const REACT_TO_MESSAGE: &str = "reaction message";
    pub const DELETE_MESSAGE: &str = "delete message";
}

/// Errors raised while decoding wire payloads.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("malformed {event} payload: {reason}")]
    Malformed { event: &'static str, reason: &'static str },
}

/// A user reference that is either a bare id or a populated user document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireUserRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        avatar: Option<String>,
    },
}

impl WireUserRef {
    pub fn id(&self) -> &str {
        match self {
            WireUserRef::Id(id) | WireUserRef::Populated { id, .. } => id,
        }
    }

    fn into_participant(self) -> Participant {
        match self {
            WireUserRef::Id(id) => Participant {
                id: UserId::new(id),
                name: None,
                avatar: None,
            },
            WireUserRef::Populated { id, name, avatar } => Participant {
                id: UserId::new(id),
                name,
                avatar,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireReaction {
    #[serde(default)]
    pub user: Option<WireUserRef>,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub sender: Option<WireUserRef>,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reactions: Option<Vec<WireReaction>>,
}

impl WireMessage {
    /// Converts into a confirmed model message.
    ///
    /// `fallback_conversation` is used when the record has no `chatId`
    /// (history payloads nest messages under their conversation).
    pub fn into_message(
        self,
        fallback_conversation: Option<&ConversationId>,
        received_at: DateTime<Utc>,
    ) -> Result<Message, WireError> {
        let conversation_id = match (self.chat_id, fallback_conversation) {
            (Some(id), _) if !id.is_empty() => ConversationId::new(id),
            (_, Some(fallback)) => fallback.clone(),
            _ => {
                return Err(WireError::Malformed {
                    event: "message",
                    reason: "missing chatId",
                });
            }
        };

        let sender_id = self
            .sender_id
            .filter(|s| !s.is_empty())
            .or_else(|| self.sender.map(|s| s.id().to_string()))
            .filter(|s| !s.is_empty())
            .ok_or(WireError::Malformed {
                event: "message",
                reason: "missing sender",
            })?;

        let mut reactions = BTreeMap::new();
        for reaction in self.reactions.unwrap_or_default() {
            if let (Some(user), Some(emoji)) = (reaction.user, reaction.emoji) {
                reactions.insert(UserId::new(user.id()), emoji);
            }
        }

        Ok(Message {
            id: self.id.filter(|id| !id.is_empty()).map(MessageId::new),
            conversation_id,
            sender_id: UserId::new(sender_id),
            content: self.content.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or(received_at),
            reactions,
            is_local_echo: false,
            local_ref: None,
            send_failed: false,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireLastMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireConversation {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub participants: Option<Vec<WireUserRef>>,
    #[serde(default)]
    pub last_message: Option<WireLastMessage>,
    #[serde(default)]
    pub messages: Option<Vec<WireMessage>>,
}

impl WireConversation {
    pub fn into_conversation(self, operator: &UserId) -> Conversation {
        let (conversation, _) = self.split(operator);
        conversation
    }

    /// Converts a `GET /chats/{id}` payload. Messages that cannot be placed
    /// are dropped; the second value counts them.
    pub fn into_history(
        self,
        operator: &UserId,
        received_at: DateTime<Utc>,
    ) -> (ConversationHistory, usize) {
        let (conversation, messages) = self.split(operator);
        let total = messages.len();
        let messages: Vec<Message> = messages
            .into_iter()
            .filter_map(|m| m.into_message(Some(&conversation.id), received_at).ok())
            .collect();
        let dropped = total - messages.len();
        (
            ConversationHistory {
                conversation,
                messages,
            },
            dropped,
        )
    }

    fn split(self, operator: &UserId) -> (Conversation, Vec<WireMessage>) {
        let participants = self
            .participants
            .unwrap_or_default()
            .into_iter()
            .map(WireUserRef::into_participant)
            .collect();
        let last_message = self.last_message.and_then(|m| m.content);
        let conversation = Conversation::from_participants(
            ConversationId::new(self.id),
            participants,
            last_message,
            operator,
        );
        (conversation, self.messages.unwrap_or_default())
    }
}

/// A push-channel frame: `{ "event": <name>, "data": <payload> }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewMessagePayload {
    #[serde(default)]
    chat_id: Option<String>,
    #[serde(default)]
    message: Option<WireMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReactionPayload {
    #[serde(default)]
    chat_id: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    emoji: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletedPayload {
    #[serde(default)]
    chat_id: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearedPayload {
    #[serde(default)]
    chat_id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl WireFrame {
    /// Validates the frame and converts it into a model event.
    pub fn into_event(self, received_at: DateTime<Utc>) -> Result<ChatEvent, WireError> {
        let WireFrame { event, data } = self;
        match event.as_str() {
            event_names::NEW_MESSAGE => {
                let payload: NewMessagePayload = serde_json::from_value(data)?;
                let outer = non_empty(payload.chat_id).map(ConversationId::new);
                let wire = payload.message.ok_or(WireError::Malformed {
                    event: event_names::NEW_MESSAGE,
                    reason: "missing message",
                })?;
                let mut message = wire.into_message(outer.as_ref(), received_at)?;
                // Without an id a broadcast can never be merged, reacted to
                // or deleted, and every redelivery would add a copy.
                if message.id.is_none() {
                    return Err(WireError::Malformed {
                        event: event_names::NEW_MESSAGE,
                        reason: "missing _id",
                    });
                }
                // The envelope's chatId scopes the event.
                if let Some(outer) = outer {
                    message.conversation_id = outer;
                }
                Ok(ChatEvent::NewMessage(message))
            }
            event_names::REACTION_UPDATED => {
                let payload: ReactionPayload = serde_json::from_value(data)?;
                let malformed = |reason| WireError::Malformed {
                    event: event_names::REACTION_UPDATED,
                    reason,
                };
                Ok(ChatEvent::ReactionUpdated {
                    conversation_id: non_empty(payload.chat_id).map(ConversationId::new),
                    message_id: non_empty(payload.message_id)
                        .map(MessageId::new)
                        .ok_or_else(|| malformed("missing messageId"))?,
                    user_id: non_empty(payload.user_id)
                        .map(UserId::new)
                        .ok_or_else(|| malformed("missing userId"))?,
                    emoji: non_empty(payload.emoji).ok_or_else(|| malformed("missing emoji"))?,
                })
            }
            event_names::MESSAGE_DELETED => {
                let payload: DeletedPayload = serde_json::from_value(data)?;
                Ok(ChatEvent::MessageDeleted {
                    conversation_id: non_empty(payload.chat_id).map(ConversationId::new),
                    message_id: non_empty(payload.message_id).map(MessageId::new).ok_or(
                        WireError::Malformed {
                            event: event_names::MESSAGE_DELETED,
                            reason: "missing messageId",
                        },
                    )?,
                })
            }
            event_names::CONVERSATION_CLEARED => {
                let payload: ClearedPayload = serde_json::from_value(data)?;
                Ok(ChatEvent::ConversationCleared {
                    conversation_id: non_empty(payload.chat_id).map(ConversationId::new).ok_or(
                        WireError::Malformed {
                            event: event_names::CONVERSATION_CLEARED,
                            reason: "missing chatId",
                        },
                    )?,
                })
            }
            _ => Err(WireError::UnknownEvent(event.clone())),
        }
    }
}

/// Decodes a text frame received on the push channel.
pub fn decode_event(text: &str, received_at: DateTime<Utc>) -> Result<ChatEvent, WireError> {
    let frame: WireFrame = serde_json::from_str(text)?;
    frame.into_event(received_at)
}

impl From<&OutboundFrame> for WireFrame {
    fn from(frame: &OutboundFrame) -> Self {
        let (event, data) = match frame {
            OutboundFrame::JoinConversation(id) => (
                event_names::JOIN_CONVERSATION,
                serde_json::Value::String(id.to_string()),
            ),
            OutboundFrame::SendMessage(msg) => (
                event_names::SEND_MESSAGE,
                serde_json::json!({
                    "chatId": msg.conversation_id,
                    "senderId": msg.sender_id,
                    "content": msg.content,
                }),
            ),
            OutboundFrame::React {
                conversation_id,
                message_id,
                user_id,
                emoji,
            } => (
                event_names::REACT_TO_MESSAGE,
                serde_json::json!({
                    "chatId": conversation_id,
                    "messageId": message_id,
                    "userId": user_id,
                    "emoji": emoji,
                }),
            ),
            OutboundFrame::DeleteMessage {
                conversation_id,
                message_id,
            } => (
                event_names::DELETE_MESSAGE,
                serde_json::json!({
                    "chatId": conversation_id,
                    "messageId": message_id,
                }),
            ),
        };
        WireFrame {
            event: event.to_string(),
            data,
        }
    }
}

/// Encodes an outbound frame as push-channel text.
pub fn encode_frame(frame: &OutboundFrame) -> Result<String, WireError> {
    Ok(serde_json::to_string(&WireFrame::from(frame))?)
}

/// `{ "data": ... }` envelope used by every REST response.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}
