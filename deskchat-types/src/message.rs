//! Chat message model.

use crate::ids::{ConversationId, MessageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A single chat message in the active conversation.
///
/// A message is either *confirmed* (carries a server-assigned `id`) or a
/// *local echo* created by an optimistic send. Local echoes have no `id`
/// and are identified client-side by `local_ref` until the reconciler
/// merges the authoritative copy over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Option<MessageId>,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// One emoji per reacting user. A new reaction replaces the previous one.
    #[serde(default)]
    pub reactions: BTreeMap<UserId, String>,
    /// True from optimistic send until the authoritative copy is merged.
    #[serde(skip)]
    pub is_local_echo: bool,
    /// Client-side handle of an optimistic message. Never sent to the server.
    #[serde(skip)]
    pub local_ref: Option<Uuid>,
    /// Set when the send of a local echo failed ("not sent").
    #[serde(skip)]
    pub send_failed: bool,
}

impl Message {
    /// Creates a server-confirmed message.
    pub fn confirmed(
        id: MessageId,
        conversation_id: ConversationId,
        sender_id: UserId,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            conversation_id,
            sender_id,
            content: content.into(),
            timestamp,
            reactions: BTreeMap::new(),
            is_local_echo: false,
            local_ref: None,
            send_failed: false,
        }
    }

    /// Creates the local echo of an optimistic send.
    pub fn optimistic(
        conversation_id: ConversationId,
        sender_id: UserId,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::optimistic_with_ref(conversation_id, sender_id, content, timestamp, Uuid::new_v4())
    }

    /// Like [`Message::optimistic`], with a caller-chosen client reference.
    pub fn optimistic_with_ref(
        conversation_id: ConversationId,
        sender_id: UserId,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
        local_ref: Uuid,
    ) -> Self {
        Self {
            id: None,
            conversation_id,
            sender_id,
            content: content.into(),
            timestamp,
            reactions: BTreeMap::new(),
            is_local_echo: true,
            local_ref: Some(local_ref),
            send_failed: false,
        }
    }

    pub fn with_reaction(mut self, user: UserId, emoji: impl Into<String>) -> Self {
        self.reactions.insert(user, emoji.into());
        self
    }

    /// Returns true if `user` authored this message.
    pub fn is_from(&self, user: &UserId) -> bool {
        &self.sender_id == user
    }

    pub fn is_confirmed(&self) -> bool {
        self.id.is_some()
    }

    /// Upserts `user`'s reaction, returning the emoji it replaced.
    pub fn set_reaction(&mut self, user: UserId, emoji: impl Into<String>) -> Option<String> {
        self.reactions.insert(user, emoji.into())
    }
}
