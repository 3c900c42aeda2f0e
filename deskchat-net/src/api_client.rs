//! Chat pull API over the admin REST endpoints.

use crate::config::NetConfig;
use crate::error::NetResult;
use crate::rest_client::AdminRestClient;
use async_trait::async_trait;
use chrono::Utc;
use deskchat_sync::{ChatApi, ChatResult};
use deskchat_types::wire::{WireConversation, WireMessage};
use deskchat_types::{
    Conversation, ConversationHistory, ConversationId, Message, MessageId, OutboundMessage,
    UserId,
};
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReactionBody<'a> {
    user_id: &'a UserId,
    emoji: &'a str,
}

/// [`ChatApi`] backed by the admin API's `/chats` endpoints.
///
/// Conversations are converted relative to `operator`, so the peer display
/// always describes the other participant.
#[derive(Clone)]
pub struct HttpChatApi {
    rest: AdminRestClient,
    operator: UserId,
}

impl HttpChatApi {
    pub fn new(config: &NetConfig, operator: UserId) -> NetResult<Self> {
        Ok(Self::with_client(AdminRestClient::new(config)?, operator))
    }

    pub fn with_client(rest: AdminRestClient, operator: UserId) -> Self {
        Self { rest, operator }
    }

    pub fn rest(&self) -> &AdminRestClient {
        &self.rest
    }

    pub async fn fetch_conversations(&self) -> NetResult<Vec<Conversation>> {
        let wire: Vec<WireConversation> = self.rest.get("/chats").await?;
        Ok(wire
            .into_iter()
            .map(|c| c.into_conversation(&self.operator))
            .collect())
    }

    pub async fn fetch_conversation(&self, id: &ConversationId) -> NetResult<ConversationHistory> {
        let wire: WireConversation = self.rest.get(&format!("/chats/{id}")).await?;
        let (history, dropped) = wire.into_history(&self.operator, Utc::now());
        if dropped > 0 {
            debug!("dropped {dropped} malformed messages from history of {id}");
        }
        Ok(history)
    }

    pub async fn create_message(&self, message: &OutboundMessage) -> NetResult<Message> {
        let wire: WireMessage = self.rest.post("/chats/message", message).await?;
        Ok(wire.into_message(Some(&message.conversation_id), Utc::now())?)
    }

    pub async fn remove_conversation(&self, id: &ConversationId) -> NetResult<()> {
        self.rest.delete(&format!("/chats/{id}")).await
    }

    pub async fn add_reaction(
        &self,
        message_id: &MessageId,
        user_id: &UserId,
        emoji: &str,
    ) -> NetResult<()> {
        let body = ReactionBody { user_id, emoji };
        let _: serde_json::Value = self
            .rest
            .post(&format!("/chats/message/{message_id}/reaction"), &body)
            .await?;
        Ok(())
    }

    pub async fn remove_message(&self, message_id: &MessageId) -> NetResult<()> {
        self.rest
            .delete(&format!("/chats/message/{message_id}"))
            .await
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn list_conversations(&self) -> ChatResult<Vec<Conversation>> {
        Ok(self.fetch_conversations().await?)
    }

    async fn get_conversation(&self, id: &ConversationId) -> ChatResult<ConversationHistory> {
        Ok(self.fetch_conversation(id).await?)
    }

    async fn post_message(&self, message: &OutboundMessage) -> ChatResult<Message> {
        Ok(self.create_message(message).await?)
    }

    async fn delete_conversation(&self, id: &ConversationId) -> ChatResult<()> {
        Ok(self.remove_conversation(id).await?)
    }

    async fn post_reaction(
        &self,
        message_id: &MessageId,
        user_id: &UserId,
        emoji: &str,
    ) -> ChatResult<()> {
        Ok(self.add_reaction(message_id, user_id, emoji).await?)
    }

    async fn delete_message(&self, message_id: &MessageId) -> ChatResult<()> {
        Ok(self.remove_message(message_id).await?)
    }
}
