//! Outbound send coordination.
//!
//! Validates a send, builds the local echo shown immediately, and the
//! message handed to the transport. Whether the transport is the push
//! channel alone or REST persistence first is the session's `DeliveryMode`.

use crate::config::DeliveryMode;
use crate::error::{ChatError, ChatResult};
use chrono::{DateTime, Utc};
use deskchat_types::{ConversationId, Message, OutboundMessage, UserId};
use uuid::Uuid;

/// A validated send: the local echo plus what goes on the wire.
#[derive(Debug, Clone)]
pub struct PreparedSend {
    /// Client-side handle of the local echo, used to flag it if the send fails.
    pub local_ref: Uuid,
    pub local: Message,
    pub outbound: OutboundMessage,
}

pub struct SendCoordinator {
    operator: UserId,
    mode: DeliveryMode,
}

impl SendCoordinator {
    pub fn new(operator: UserId, mode: DeliveryMode) -> Self {
        Self { operator, mode }
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Validates and prepares a send to `target`.
    ///
    /// Rejected before any network call when the content is blank, nothing
    /// is selected, or `target` is not the active conversation.
    pub fn prepare(
        &self,
        active: Option<&ConversationId>,
        target: &ConversationId,
        content: &str,
        now: DateTime<Utc>,
    ) -> ChatResult<PreparedSend> {
        if content.trim().is_empty() {
            return Err(ChatError::EmptyContent);
        }
        let active = active.ok_or(ChatError::NoActiveConversation)?;
        if active != target {
            return Err(ChatError::NotActive(target.to_string()));
        }

        let local_ref = Uuid::new_v4();
        let local = Message::optimistic_with_ref(
            target.clone(),
            self.operator.clone(),
            content,
            now,
            local_ref,
        );
        let outbound = OutboundMessage {
            conversation_id: target.clone(),
            sender_id: self.operator.clone(),
            content: content.to_string(),
        };
        Ok(PreparedSend {
            local_ref,
            local,
            outbound,
        })
    }
}
