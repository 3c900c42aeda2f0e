//! Event reconciler: applies push events and history loads to the store.
//!
//! Pure state machine, no I/O. The session owns the network and feeds
//! results in; the reconciler decides what they mean for the log.
//!
//! ```text
//! Idle ──begin_select──▶ Subscribed(Loading) ──apply_history──▶ Subscribed(Live)
//!   ▲                          │  events queued                   │ events applied
//!   └────────deselect──────────┴──────────────────────────────────┘
//! ```
//!
//! Events that arrive between subscribe and history are queued and
//! replayed after the history is applied, so a `clear` + load never loses
//! them. Every select bumps a generation; a history result stamped with an
//! older generation belongs to a conversation the operator has left and is
//! discarded.

use crate::store::{MessageStore, ReplaceOutcome};
use deskchat_types::{ChatEvent, ConversationId, Message};
use std::time::Duration;
use tracing::debug;

/// Proof that a history fetch was issued for a particular selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectTicket {
    pub conversation_id: ConversationId,
    pub generation: u64,
}

/// What applying an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Out of scope, or referenced something not in the log.
    Ignored,
    /// Held until the history of the active conversation is applied.
    Queued,
    Appended,
    /// Merged over an existing entry (typically the local echo of a send).
    Replaced,
    Reacted,
    Removed,
    Cleared,
}

impl EventOutcome {
    /// Returns true if the visible log changed.
    pub fn changed_log(&self) -> bool {
        !matches!(self, EventOutcome::Ignored | EventOutcome::Queued)
    }
}

#[derive(Debug)]
enum Phase {
    Loading { queued: Vec<ChatEvent> },
    Live,
}

#[derive(Debug)]
enum State {
    Idle,
    Subscribed {
        conversation_id: ConversationId,
        phase: Phase,
    },
}

pub struct Reconciler {
    store: MessageStore,
    state: State,
    generation: u64,
}

impl Reconciler {
    pub fn new(echo_window: Option<Duration>) -> Self {
        Self {
            store: MessageStore::new(echo_window),
            state: State::Idle,
            generation: 0,
        }
    }

    /// Switches to `conversation_id`: clears the log and starts queueing
    /// events until its history arrives.
    pub fn begin_select(&mut self, conversation_id: ConversationId) -> SelectTicket {
        self.generation += 1;
        self.store.clear();
        self.state = State::Subscribed {
            conversation_id: conversation_id.clone(),
            phase: Phase::Loading { queued: Vec::new() },
        };
        SelectTicket {
            conversation_id,
            generation: self.generation,
        }
    }

    /// Drops the active conversation and its log.
    pub fn deselect(&mut self) {
        self.generation += 1;
        self.store.clear();
        self.state = State::Idle;
    }

    /// Returns true if `ticket` belongs to the current selection.
    pub fn is_current(&self, ticket: &SelectTicket) -> bool {
        ticket.generation == self.generation
            && self.active() == Some(&ticket.conversation_id)
    }

    /// Applies a history load, then replays the events queued while it was
    /// in flight. Returns false if the ticket is stale (nothing changes).
    pub fn apply_history(&mut self, ticket: &SelectTicket, messages: Vec<Message>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "discarding stale history for {} (generation {}, current {})",
                ticket.conversation_id, ticket.generation, self.generation
            );
            return false;
        }

        // Only sends made during the load can be in the log. They go after
        // the history and are never merged into an older message.
        let pending = self.store.take_local_echoes();
        let mut merged = 0usize;
        for message in messages {
            if message.conversation_id != ticket.conversation_id {
                continue;
            }
            if self.store.replace_or_append(message).is_replace() {
                merged += 1;
            }
        }
        if merged > 0 {
            debug!("history for {} merged {merged} entries", ticket.conversation_id);
        }
        for echo in pending {
            self.store.append(echo);
        }

        self.go_live();
        true
    }

    /// Gives up on the history of the current selection but keeps the
    /// subscription live. Returns false if the ticket is stale.
    pub fn history_failed(&mut self, ticket: &SelectTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.go_live();
        true
    }

    fn go_live(&mut self) {
        let queued = match &mut self.state {
            State::Subscribed { phase, .. } => {
                match std::mem::replace(phase, Phase::Live) {
                    Phase::Loading { queued } => queued,
                    Phase::Live => Vec::new(),
                }
            }
            State::Idle => return,
        };
        if !queued.is_empty() {
            debug!("replaying {} events queued during history load", queued.len());
        }
        for event in queued {
            self.apply(event);
        }
    }

    /// Handles one inbound event for the active conversation.
    pub fn handle_event(&mut self, event: ChatEvent) -> EventOutcome {
        let (active, phase) = match &mut self.state {
            State::Idle => return EventOutcome::Ignored,
            State::Subscribed {
                conversation_id,
                phase,
            } => (conversation_id, phase),
        };

        if let Some(scope) = event.conversation_id() {
            if scope != &*active {
                return EventOutcome::Ignored;
            }
        }

        if let ChatEvent::NewMessage(message) = &event {
            if message.id.is_none() {
                debug!("dropping message without id in {}", message.conversation_id);
                return EventOutcome::Ignored;
            }
        }

        if let Phase::Loading { queued } = phase {
            queued.push(event);
            return EventOutcome::Queued;
        }

        self.apply(event)
    }

    fn apply(&mut self, event: ChatEvent) -> EventOutcome {
        match event {
            ChatEvent::NewMessage(message) => match self.store.replace_or_append(message) {
                ReplaceOutcome::Replaced(_) => EventOutcome::Replaced,
                ReplaceOutcome::Appended(_) => EventOutcome::Appended,
            },
            ChatEvent::ReactionUpdated {
                message_id,
                user_id,
                emoji,
                ..
            } => {
                if self.store.apply_reaction(&message_id, user_id, emoji) {
                    EventOutcome::Reacted
                } else {
                    EventOutcome::Ignored
                }
            }
            ChatEvent::MessageDeleted { message_id, .. } => {
                match self.store.remove_by_id(&message_id) {
                    Some(_) => EventOutcome::Removed,
                    None => EventOutcome::Ignored,
                }
            }
            ChatEvent::ConversationCleared { .. } => {
                self.store.clear();
                EventOutcome::Cleared
            }
        }
    }

    pub fn active(&self) -> Option<&ConversationId> {
        match &self.state {
            State::Idle => None,
            State::Subscribed {
                conversation_id, ..
            } => Some(conversation_id),
        }
    }

    /// Returns true while the history of the active conversation is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(
            self.state,
            State::Subscribed {
                phase: Phase::Loading { .. },
                ..
            }
        )
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Direct access for optimistic appends and send-failure marks.
    pub fn store_mut(&mut self) -> &mut MessageStore {
        &mut self.store
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
