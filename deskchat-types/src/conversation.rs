//! Conversation directory model.

use crate::ids::{ConversationId, UserId};
use crate::message::Message;
use serde::{Deserialize, Serialize};

/// Name shown when the counterpart has no display name.
pub const DEFAULT_PEER_NAME: &str = "Unknown User";
/// Avatar shown when the counterpart has no avatar.
pub const DEFAULT_PEER_AVATAR: &str = "https://via.placeholder.com/40";
/// Preview shown for a conversation without messages.
pub const EMPTY_PREVIEW: &str = "No messages yet";

/// The admin-side user of the chat widget. Fixed for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: UserId,
    pub display_name: String,
}

impl Operator {
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// A conversation participant as reported by the transport service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: UserId,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// Display data of the non-operator participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDisplay {
    /// `None` when the conversation has no participant besides the operator.
    pub user_id: Option<UserId>,
    pub name: String,
    pub avatar: String,
}

impl PeerDisplay {
    fn unknown() -> Self {
        Self {
            user_id: None,
            name: DEFAULT_PEER_NAME.to_string(),
            avatar: DEFAULT_PEER_AVATAR.to_string(),
        }
    }
}

/// A two-party conversation as seen from the operator's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: Vec<UserId>,
    pub peer: PeerDisplay,
    /// Advisory snapshot of the latest message; may lag until the next refresh.
    pub last_message_preview: String,
}

impl Conversation {
    /// Builds a conversation, deriving the peer display from the first
    /// participant that is not `operator`.
    pub fn from_participants(
        id: ConversationId,
        participants: Vec<Participant>,
        last_message: Option<String>,
        operator: &UserId,
    ) -> Self {
        let peer = participants
            .iter()
            .find(|p| &p.id != operator)
            .map(|p| PeerDisplay {
                user_id: Some(p.id.clone()),
                name: p
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_PEER_NAME.to_string()),
                avatar: p
                    .avatar
                    .clone()
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_PEER_AVATAR.to_string()),
            })
            .unwrap_or_else(PeerDisplay::unknown);

        Self {
            id,
            participants: participants.into_iter().map(|p| p.id).collect(),
            peer,
            last_message_preview: last_message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| EMPTY_PREVIEW.to_string()),
        }
    }

    /// Returns true if `user` takes part in this conversation.
    pub fn involves(&self, user: &UserId) -> bool {
        self.participants.iter().any(|p| p == user)
    }
}

/// Result of pulling one conversation with its message history.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationHistory {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}
