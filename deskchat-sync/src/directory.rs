//! Conversation directory: the conversations visible to the operator.
//!
//! The directory only reads conversations; they are created server-side
//! when two parties first exchange a message. A refresh swaps the whole
//! snapshot or nothing: a failed pull records an error and leaves the
//! previous snapshot in place.

use crate::error::{ChatError, ChatResult};
use crate::transport::ChatApi;
use deskchat_types::{Conversation, ConversationId, Message, UserId};
use tracing::{debug, warn};

/// Longest preview kept for the directory listing, in characters.
const PREVIEW_MAX_CHARS: usize = 80;

pub struct ConversationDirectory {
    operator: UserId,
    conversations: Vec<Conversation>,
    active: Option<ConversationId>,
    last_error: Option<String>,
    /// Bumped on every refresh start; results from older refreshes are dropped.
    refresh_generation: u64,
}

impl ConversationDirectory {
    pub fn new(operator: UserId) -> Self {
        Self {
            operator,
            conversations: Vec::new(),
            active: None,
            last_error: None,
            refresh_generation: 0,
        }
    }

    /// Pulls the conversation list and applies it.
    pub async fn refresh(&mut self, api: &dyn ChatApi) -> ChatResult<()> {
        let generation = self.begin_refresh();
        let result = api.list_conversations().await;
        self.apply_refresh(generation, result);
        match self.last_error() {
            Some(e) => Err(ChatError::Api(e.to_string())),
            None => Ok(()),
        }
    }

    /// Starts a refresh and returns the generation its result must carry.
    pub fn begin_refresh(&mut self) -> u64 {
        self.refresh_generation += 1;
        self.refresh_generation
    }

    /// Applies the result of the refresh started as `generation`.
    ///
    /// Returns false if a newer refresh has started since, in which case
    /// nothing changes.
    pub fn apply_refresh(
        &mut self,
        generation: u64,
        result: ChatResult<Vec<Conversation>>,
    ) -> bool {
        if generation != self.refresh_generation {
            debug!("dropping directory refresh {generation}, current is {}", self.refresh_generation);
            return false;
        }

        match result {
            Ok(conversations) => {
                let total = conversations.len();
                self.conversations = conversations
                    .into_iter()
                    .filter(|c| c.involves(&self.operator))
                    .collect();
                self.last_error = None;
                debug!(
                    "directory refreshed: {} of {total} conversations involve the operator",
                    self.conversations.len()
                );
            }
            Err(e) => {
                warn!("directory refresh failed, keeping previous snapshot: {e}");
                self.last_error = Some(e.to_string());
            }
        }
        true
    }

    /// Marks a conversation active. Returns false if the directory does not
    /// list it (it is selected anyway).
    pub fn select(&mut self, id: ConversationId) -> bool {
        let known = self.get(&id).is_some();
        self.active = Some(id);
        known
    }

    pub fn clear_selection(&mut self) {
        self.active = None;
    }

    /// Drops a deleted conversation. Returns true if it was the active one,
    /// in which case the selection is cleared too.
    pub fn remove_conversation(&mut self, id: &ConversationId) -> bool {
        self.conversations.retain(|c| &c.id != id);
        if self.active.as_ref() == Some(id) {
            self.active = None;
            true
        } else {
            false
        }
    }

    /// Patches the preview of the message's conversation. Returns false if
    /// the conversation is not listed.
    pub fn note_message(&mut self, message: &Message) -> bool {
        match self
            .conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
        {
            Some(conversation) => {
                conversation.last_message_preview = preview(&message.content);
                true
            }
            None => false,
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    pub fn active(&self) -> Option<&ConversationId> {
        self.active.as_ref()
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    /// Error of the last failed refresh, cleared by the next successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn operator(&self) -> &UserId {
        &self.operator
    }
}

fn preview(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= PREVIEW_MAX_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(PREVIEW_MAX_CHARS - 1).collect();
    out.push('…');
    out
}
