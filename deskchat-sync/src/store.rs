//! Ordered, deduplicated message log of the active conversation.

use crate::matching::is_same_message;
use deskchat_types::{Message, MessageId, UserId};
use std::time::Duration;
use uuid::Uuid;

/// What `replace_or_append` did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// Merged over the entry at this position.
    Replaced(usize),
    /// Added at this position (the end of the log).
    Appended(usize),
}

impl ReplaceOutcome {
    pub fn is_replace(&self) -> bool {
        matches!(self, ReplaceOutcome::Replaced(_))
    }
}

/// Message log in arrival order.
///
/// Arrival order from mixed pull/push sources is display order; entries are
/// never re-sorted by timestamp.
#[derive(Debug, Default)]
pub struct MessageStore {
    entries: Vec<Message>,
    echo_window: Option<Duration>,
}

impl MessageStore {
    pub fn new(echo_window: Option<Duration>) -> Self {
        Self {
            entries: Vec::new(),
            echo_window,
        }
    }

    /// Appends without any matching.
    pub fn append(&mut self, message: Message) {
        self.entries.push(message);
    }

    /// Merges `candidate` over the entry it matches, or appends it.
    ///
    /// An entry with the same id wins over any local echo. Otherwise the
    /// earliest matching echo is taken, so back-to-back identical sends each
    /// consume exactly one. A merged entry keeps its position and loses its
    /// local-echo state.
    pub fn replace_or_append(&mut self, mut candidate: Message) -> ReplaceOutcome {
        let by_id = candidate.id.as_ref().and_then(|id| {
            self.entries
                .iter()
                .position(|existing| existing.id.as_ref() == Some(id))
        });
        let position = by_id.or_else(|| {
            self.entries
                .iter()
                .position(|existing| is_same_message(existing, &candidate, self.echo_window))
        });

        match position {
            Some(idx) => {
                candidate.is_local_echo = false;
                candidate.local_ref = None;
                candidate.send_failed = false;
                self.entries[idx] = candidate;
                ReplaceOutcome::Replaced(idx)
            }
            None => {
                self.entries.push(candidate);
                ReplaceOutcome::Appended(self.entries.len() - 1)
            }
        }
    }

    /// Removes the entry with this authoritative id. Idempotent.
    pub fn remove_by_id(&mut self, id: &MessageId) -> Option<Message> {
        let idx = self
            .entries
            .iter()
            .position(|m| m.id.as_ref() == Some(id))?;
        Some(self.entries.remove(idx))
    }

    /// Upserts `user`'s reaction on a message. Returns false if the message
    /// is not in the log.
    pub fn apply_reaction(&mut self, id: &MessageId, user: UserId, emoji: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|m| m.id.as_ref() == Some(id)) {
            Some(message) => {
                message.set_reaction(user, emoji);
                true
            }
            None => false,
        }
    }

    /// Flags a local echo as not sent. Returns false if it is gone (merged
    /// or cleared in the meantime).
    pub fn mark_send_failed(&mut self, local_ref: &Uuid) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|m| m.is_local_echo && m.local_ref.as_ref() == Some(local_ref))
        {
            Some(message) => {
                message.send_failed = true;
                true
            }
            None => false,
        }
    }

    /// Removes and returns every local echo, in log order.
    pub fn take_local_echoes(&mut self) -> Vec<Message> {
        let (echoes, kept) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|m| m.is_local_echo);
        self.entries = kept;
        echoes
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current log for rendering.
    pub fn all(&self) -> &[Message] {
        &self.entries
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.entries.iter().find(|m| m.id.as_ref() == Some(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries still awaiting their authoritative copy.
    pub fn pending_echo_count(&self) -> usize {
        self.entries.iter().filter(|m| m.is_local_echo).count()
    }
}
