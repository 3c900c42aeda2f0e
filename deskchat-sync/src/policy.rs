//! Moderation policy: who may react to or withdraw which message.
//!
//! `OwnMessagesPolicy` is the default: the operator may react to any
//! message but only withdraw their own. `AllowAllPolicy` lifts the
//! withdrawal restriction.

use crate::error::ChatError;
use deskchat_types::{Message, UserId};

/// Authorization hooks checked before a reaction or deletion leaves the client.
pub trait ModerationPolicy: Send + Sync {
    /// Return `Err` to refuse the reaction.
    fn check_react(&self, operator: &UserId, message: &Message) -> Result<(), ChatError>;

    /// Return `Err` to refuse the deletion.
    fn check_delete(&self, operator: &UserId, message: &Message) -> Result<(), ChatError>;
}

// ── AllowAllPolicy ──────────────────────────────────────────────

/// Any operator may react to and withdraw any message.
pub struct AllowAllPolicy;

impl ModerationPolicy for AllowAllPolicy {
    fn check_react(&self, _operator: &UserId, _message: &Message) -> Result<(), ChatError> {
        Ok(())
    }

    fn check_delete(&self, _operator: &UserId, _message: &Message) -> Result<(), ChatError> {
        Ok(())
    }
}

// ── OwnMessagesPolicy ───────────────────────────────────────────

/// Reactions on anything; deletion only of messages the operator authored.
#[derive(Debug, Default)]
pub struct OwnMessagesPolicy;

impl ModerationPolicy for OwnMessagesPolicy {
    fn check_react(&self, _operator: &UserId, _message: &Message) -> Result<(), ChatError> {
        Ok(())
    }

    fn check_delete(&self, operator: &UserId, message: &Message) -> Result<(), ChatError> {
        if message.is_from(operator) {
            Ok(())
        } else {
            Err(ChatError::Forbidden(format!(
                "message {} was not sent by {operator}",
                message
                    .id
                    .as_ref()
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "<unsent>".to_string())
            )))
        }
    }
}
