//! Chat session: the event loop behind the live chat widget.
//!
//! Owns the directory, the reconciler and the send coordinator, and is the
//! only place that talks to the network. Everything else reaches it
//! through a [`ChatHandle`]:
//! - commands from the UI (select, send, react, delete, snapshot)
//! - events from the push channel
//! - completions of spawned pull/persist calls
//!
//! Network calls run in spawned tasks and report back on an internal
//! channel, so a slow history load never stalls inbound events. All state
//! mutation happens on the loop, in arrival order.

use crate::config::{ChatConfig, DeliveryMode};
use crate::directory::ConversationDirectory;
use crate::error::{ChatError, ChatResult};
use crate::outbound::SendCoordinator;
use crate::policy::{ModerationPolicy, OwnMessagesPolicy};
use crate::reconciler::{Reconciler, SelectTicket};
use crate::transport::{ChannelEvent, ChatApi, PushChannel};

use chrono::Utc;
use deskchat_types::{
    ChatEvent, Conversation, ConversationHistory, ConversationId, Message, MessageId, Operator,
    OutboundFrame, UserId,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

type Reply<T> = oneshot::Sender<ChatResult<T>>;

/// Commands accepted by the session loop.
#[derive(Debug)]
pub enum ChatCommand {
    /// Makes a conversation active and loads its history.
    Select { conversation_id: ConversationId },
    ClearSelection,
    /// Sends a message; replies with the local reference of the echo.
    Send {
        conversation_id: ConversationId,
        content: String,
        reply: Reply<Uuid>,
    },
    React {
        message_id: MessageId,
        emoji: String,
        reply: Reply<()>,
    },
    DeleteMessage {
        message_id: MessageId,
        reply: Reply<()>,
    },
    DeleteConversation {
        conversation_id: ConversationId,
        reply: Reply<()>,
    },
    RefreshDirectory,
    Snapshot { reply: oneshot::Sender<ChatSnapshot> },
    Shutdown,
}

/// Notifications for the UI. Delivered best-effort: a UI that falls behind
/// misses updates and should re-read a [`ChatSnapshot`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChatUpdate {
    DirectoryChanged,
    DirectoryError {
        error: String,
    },
    SelectionChanged {
        active: Option<ConversationId>,
    },
    MessagesChanged {
        conversation_id: ConversationId,
    },
    HistoryLoaded {
        conversation_id: ConversationId,
        count: usize,
    },
    HistoryFailed {
        conversation_id: ConversationId,
        error: String,
    },
    SendFailed {
        conversation_id: ConversationId,
        local_ref: Uuid,
        error: String,
    },
    ConnectionChanged {
        connected: bool,
    },
    Error {
        error: String,
    },
}

/// Point-in-time copy of everything the widget renders.
#[derive(Debug, Clone, Default)]
pub struct ChatSnapshot {
    pub active: Option<ConversationId>,
    /// True while the history of `active` is in flight.
    pub loading: bool,
    pub messages: Vec<Message>,
    pub conversations: Vec<Conversation>,
    pub directory_error: Option<String>,
    pub connected: bool,
}

impl ChatSnapshot {
    pub fn active_conversation(&self) -> Option<&Conversation> {
        let active = self.active.as_ref()?;
        self.conversations.iter().find(|c| &c.id == active)
    }
}

/// Results of spawned network calls, handed back to the loop.
enum Completion {
    Directory {
        generation: u64,
        result: ChatResult<Vec<Conversation>>,
    },
    History {
        ticket: SelectTicket,
        result: ChatResult<ConversationHistory>,
    },
    Sent {
        conversation_id: ConversationId,
        local_ref: Uuid,
        /// The persisted copy when delivery went through the API first.
        result: ChatResult<Option<Message>>,
    },
    Reacted {
        conversation_id: ConversationId,
        message_id: MessageId,
        user_id: UserId,
        emoji: String,
        result: ChatResult<()>,
        reply: Reply<()>,
    },
    MessageDeleted {
        conversation_id: ConversationId,
        message_id: MessageId,
        result: ChatResult<()>,
        reply: Reply<()>,
    },
    ConversationDeleted {
        conversation_id: ConversationId,
        result: ChatResult<()>,
        reply: Reply<()>,
    },
}

/// Handle for driving a running [`ChatSession`].
#[derive(Clone)]
pub struct ChatHandle {
    command_tx: mpsc::Sender<ChatCommand>,
}

impl ChatHandle {
    /// Sends a raw command to the session.
    pub async fn send_command(&self, cmd: ChatCommand) -> ChatResult<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| ChatError::ChannelClosed)
    }

    pub async fn select(&self, conversation_id: ConversationId) -> ChatResult<()> {
        self.send_command(ChatCommand::Select { conversation_id })
            .await
    }

    pub async fn clear_selection(&self) -> ChatResult<()> {
        self.send_command(ChatCommand::ClearSelection).await
    }

    /// Sends `content` to the active conversation.
    ///
    /// Returns once the local echo is in the log, with its local reference.
    /// Delivery continues in the background; a failure is reported as
    /// [`ChatUpdate::SendFailed`] and the echo is flagged.
    pub async fn send(
        &self,
        conversation_id: ConversationId,
        content: impl Into<String>,
    ) -> ChatResult<Uuid> {
        let (reply, rx) = oneshot::channel();
        self.send_command(ChatCommand::Send {
            conversation_id,
            content: content.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| ChatError::ChannelClosed)?
    }

    pub async fn react_to_message(
        &self,
        message_id: MessageId,
        emoji: impl Into<String>,
    ) -> ChatResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send_command(ChatCommand::React {
            message_id,
            emoji: emoji.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| ChatError::ChannelClosed)?
    }

    pub async fn delete_message(&self, message_id: MessageId) -> ChatResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send_command(ChatCommand::DeleteMessage { message_id, reply })
            .await?;
        rx.await.map_err(|_| ChatError::ChannelClosed)?
    }

    pub async fn delete_conversation(&self, conversation_id: ConversationId) -> ChatResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send_command(ChatCommand::DeleteConversation {
            conversation_id,
            reply,
        })
        .await?;
        rx.await.map_err(|_| ChatError::ChannelClosed)?
    }

    pub async fn refresh_directory(&self) -> ChatResult<()> {
        self.send_command(ChatCommand::RefreshDirectory).await
    }

    pub async fn snapshot(&self) -> ChatResult<ChatSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send_command(ChatCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| ChatError::ChannelClosed)
    }

    /// Stops the session. The push channel is disconnected before `run`
    /// returns.
    pub async fn shutdown(&self) -> ChatResult<()> {
        self.send_command(ChatCommand::Shutdown).await
    }
}

/// Disconnects the push channel exactly once, even if `run` is dropped
/// mid-flight.
struct ConnectionGuard {
    channel: Option<Arc<dyn PushChannel>>,
}

impl ConnectionGuard {
    fn new(channel: Arc<dyn PushChannel>) -> Self {
        Self {
            channel: Some(channel),
        }
    }

    async fn release(mut self) {
        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.disconnect().await {
                warn!("[CHAT] disconnect failed: {e}");
            }
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let Some(channel) = self.channel.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = channel.disconnect().await {
                        warn!("[CHAT] disconnect on drop failed: {e}");
                    }
                });
            }
            Err(_) => warn!("[CHAT] session dropped outside a runtime, push channel left open"),
        }
    }
}

/// The chat session event loop.
pub struct ChatSession {
    operator: Operator,
    config: ChatConfig,
    api: Arc<dyn ChatApi>,
    channel: Arc<dyn PushChannel>,
    policy: Arc<dyn ModerationPolicy>,
    directory: ConversationDirectory,
    reconciler: Reconciler,
    sender: SendCoordinator,
    command_rx: mpsc::Receiver<ChatCommand>,
    update_tx: mpsc::Sender<ChatUpdate>,
    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,
    channel_open: bool,
}

/// Creates a chat session for `operator` with the default moderation
/// policy (operators may only delete their own messages).
pub fn create_chat_session(
    config: ChatConfig,
    operator: Operator,
    api: Arc<dyn ChatApi>,
    channel: Arc<dyn PushChannel>,
) -> (ChatHandle, mpsc::Receiver<ChatUpdate>, ChatSession) {
    let policy = Arc::new(OwnMessagesPolicy);
    create_chat_session_with_policy(config, operator, api, channel, policy)
}

/// Creates a chat session with a custom moderation policy.
pub fn create_chat_session_with_policy(
    config: ChatConfig,
    operator: Operator,
    api: Arc<dyn ChatApi>,
    channel: Arc<dyn PushChannel>,
    policy: Arc<dyn ModerationPolicy>,
) -> (ChatHandle, mpsc::Receiver<ChatUpdate>, ChatSession) {
    let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
    let (update_tx, update_rx) = mpsc::channel(config.update_buffer.max(1));
    let (completion_tx, completion_rx) = mpsc::channel(64);

    let session = ChatSession {
        directory: ConversationDirectory::new(operator.id.clone()),
        reconciler: Reconciler::new(config.echo_window()),
        sender: SendCoordinator::new(operator.id.clone(), config.delivery_mode),
        operator,
        config,
        api,
        channel,
        policy,
        command_rx,
        update_tx,
        completion_tx,
        completion_rx,
        channel_open: true,
    };

    (ChatHandle { command_tx }, update_rx, session)
}

impl ChatSession {
    /// Runs the session until shutdown or until every handle is dropped.
    pub async fn run(mut self) -> ChatResult<()> {
        info!(
            "[CHAT] session started for {} ({}), {:?}",
            self.operator.display_name,
            self.operator.id,
            self.sender.mode()
        );

        let guard = ConnectionGuard::new(self.channel.clone());
        match self.channel.connect().await {
            Ok(()) => self.notify(ChatUpdate::ConnectionChanged { connected: true }),
            Err(e) => {
                warn!("[CHAT] push channel connect failed: {e}");
                self.notify(ChatUpdate::Error {
                    error: e.to_string(),
                });
            }
        }

        self.start_directory_refresh();

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if !self.handle_command(cmd).await {
                                info!("[CHAT] shutting down");
                                break;
                            }
                        }
                        None => {
                            info!("[CHAT] all handles dropped, stopping");
                            break;
                        }
                    }
                }
                Some(done) = self.completion_rx.recv() => {
                    self.handle_completion(done);
                }
                item = self.channel.recv(), if self.channel_open => {
                    match item {
                        Some(item) => self.handle_channel_event(item).await,
                        None => {
                            warn!("[CHAT] push channel closed");
                            self.channel_open = false;
                            self.notify(ChatUpdate::ConnectionChanged { connected: false });
                        }
                    }
                }
            }
        }

        guard.release().await;
        info!("[CHAT] session stopped");
        Ok(())
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Returns false when the loop should stop.
    async fn handle_command(&mut self, cmd: ChatCommand) -> bool {
        match cmd {
            ChatCommand::Select { conversation_id } => self.select(conversation_id).await,
            ChatCommand::ClearSelection => {
                self.directory.clear_selection();
                self.reconciler.deselect();
                self.notify(ChatUpdate::SelectionChanged { active: None });
            }
            ChatCommand::Send {
                conversation_id,
                content,
                reply,
            } => {
                let result = self.send(conversation_id, content);
                if let Err(e) = &result {
                    debug!("[CHAT] send rejected: {e}");
                }
                let _ = reply.send(result);
            }
            ChatCommand::React {
                message_id,
                emoji,
                reply,
            } => self.react(message_id, emoji, reply),
            ChatCommand::DeleteMessage { message_id, reply } => {
                self.delete_message(message_id, reply)
            }
            ChatCommand::DeleteConversation {
                conversation_id,
                reply,
            } => self.delete_conversation(conversation_id, reply),
            ChatCommand::RefreshDirectory => self.start_directory_refresh(),
            ChatCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            ChatCommand::Shutdown => return false,
        }
        true
    }

    async fn select(&mut self, conversation_id: ConversationId) {
        if !self.directory.select(conversation_id.clone()) {
            debug!("[CHAT] selecting {conversation_id}, not in the directory yet");
        }
        let ticket = self.reconciler.begin_select(conversation_id.clone());
        info!(
            "[CHAT] selected {conversation_id} (generation {})",
            ticket.generation
        );
        self.notify(ChatUpdate::SelectionChanged {
            active: Some(conversation_id.clone()),
        });

        // Subscribe before pulling so nothing published in between is lost;
        // events arriving before the history are queued by the reconciler.
        if let Err(e) = self.channel.join_conversation(&conversation_id).await {
            warn!("[CHAT] failed to join {conversation_id}: {e}");
            self.notify(ChatUpdate::Error {
                error: e.to_string(),
            });
        }

        let api = self.api.clone();
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = api.get_conversation(&ticket.conversation_id).await;
            let _ = tx.send(Completion::History { ticket, result }).await;
        });
    }

    fn send(&mut self, conversation_id: ConversationId, content: String) -> ChatResult<Uuid> {
        let prepared = self.sender.prepare(
            self.reconciler.active(),
            &conversation_id,
            &content,
            Utc::now(),
        )?;
        let local_ref = prepared.local_ref;

        self.directory.note_message(&prepared.local);
        self.reconciler.store_mut().append(prepared.local);
        self.notify(ChatUpdate::MessagesChanged {
            conversation_id: conversation_id.clone(),
        });

        let mode = self.sender.mode();
        let outbound = prepared.outbound;
        let api = self.api.clone();
        let channel = self.channel.clone();
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = match mode {
                DeliveryMode::OptimisticFirst => channel
                    .emit(OutboundFrame::SendMessage(outbound))
                    .await
                    .map(|()| None),
                DeliveryMode::ConfirmFirst => match api.post_message(&outbound).await {
                    Ok(persisted) => {
                        if let Err(e) = channel.emit(OutboundFrame::SendMessage(outbound)).await {
                            warn!("[CHAT] message persisted but not broadcast: {e}");
                        }
                        Ok(Some(persisted))
                    }
                    Err(e) => Err(e),
                },
            };
            let _ = tx
                .send(Completion::Sent {
                    conversation_id,
                    local_ref,
                    result,
                })
                .await;
        });

        Ok(local_ref)
    }

    /// Resolves a message of the active conversation for a moderation action.
    fn lookup_for_action(&self, message_id: &MessageId) -> ChatResult<(ConversationId, &Message)> {
        let conversation_id = self
            .reconciler
            .active()
            .cloned()
            .ok_or(ChatError::NoActiveConversation)?;
        let message = self
            .reconciler
            .store()
            .get(message_id)
            .ok_or_else(|| ChatError::MessageNotFound(message_id.to_string()))?;
        Ok((conversation_id, message))
    }

    fn react(&mut self, message_id: MessageId, emoji: String, reply: Reply<()>) {
        if emoji.trim().is_empty() {
            let _ = reply.send(Err(ChatError::EmptyContent));
            return;
        }
        let conversation_id = match self.lookup_for_action(&message_id).and_then(|(cid, msg)| {
            self.policy.check_react(&self.operator.id, msg)?;
            Ok(cid)
        }) {
            Ok(cid) => cid,
            Err(e) => {
                let _ = reply.send(Err(e));
                return;
            }
        };

        let api = self.api.clone();
        let channel = self.channel.clone();
        let tx = self.completion_tx.clone();
        let user_id = self.operator.id.clone();
        tokio::spawn(async move {
            let result = api.post_reaction(&message_id, &user_id, &emoji).await;
            if result.is_ok() {
                let frame = OutboundFrame::React {
                    conversation_id: conversation_id.clone(),
                    message_id: message_id.clone(),
                    user_id: user_id.clone(),
                    emoji: emoji.clone(),
                };
                if let Err(e) = channel.emit(frame).await {
                    warn!("[CHAT] reaction saved but not broadcast: {e}");
                }
            }
            let _ = tx
                .send(Completion::Reacted {
                    conversation_id,
                    message_id,
                    user_id,
                    emoji,
                    result,
                    reply,
                })
                .await;
        });
    }

    fn delete_message(&mut self, message_id: MessageId, reply: Reply<()>) {
        let conversation_id = match self.lookup_for_action(&message_id).and_then(|(cid, msg)| {
            self.policy.check_delete(&self.operator.id, msg)?;
            Ok(cid)
        }) {
            Ok(cid) => cid,
            Err(e) => {
                let _ = reply.send(Err(e));
                return;
            }
        };

        let api = self.api.clone();
        let channel = self.channel.clone();
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = api.delete_message(&message_id).await;
            if result.is_ok() {
                let frame = OutboundFrame::DeleteMessage {
                    conversation_id: conversation_id.clone(),
                    message_id: message_id.clone(),
                };
                if let Err(e) = channel.emit(frame).await {
                    warn!("[CHAT] deletion saved but not broadcast: {e}");
                }
            }
            let _ = tx
                .send(Completion::MessageDeleted {
                    conversation_id,
                    message_id,
                    result,
                    reply,
                })
                .await;
        });
    }

    fn delete_conversation(&mut self, conversation_id: ConversationId, reply: Reply<()>) {
        let api = self.api.clone();
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = api.delete_conversation(&conversation_id).await;
            let _ = tx
                .send(Completion::ConversationDeleted {
                    conversation_id,
                    result,
                    reply,
                })
                .await;
        });
    }

    fn start_directory_refresh(&mut self) {
        let generation = self.directory.begin_refresh();
        debug!("[CHAT] refreshing directory (generation {generation})");
        let api = self.api.clone();
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = api.list_conversations().await;
            let _ = tx.send(Completion::Directory { generation, result }).await;
        });
    }

    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            active: self.reconciler.active().cloned(),
            loading: self.reconciler.is_loading(),
            messages: self.reconciler.store().all().to_vec(),
            conversations: self.directory.conversations().to_vec(),
            directory_error: self.directory.last_error().map(str::to_string),
            connected: self.channel.is_connected(),
        }
    }

    // ── Completions ──────────────────────────────────────────────

    fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::Directory { generation, result } => {
                if !self.directory.apply_refresh(generation, result) {
                    return;
                }
                match self.directory.last_error() {
                    Some(error) => {
                        warn!("[CHAT] directory refresh failed: {error}");
                        let error = error.to_string();
                        self.notify(ChatUpdate::DirectoryError { error });
                    }
                    None => self.notify(ChatUpdate::DirectoryChanged),
                }
            }

            Completion::History { ticket, result } => {
                let conversation_id = ticket.conversation_id.clone();
                match result {
                    Ok(history) => {
                        let count = history.messages.len();
                        if self.reconciler.apply_history(&ticket, history.messages) {
                            info!("[CHAT] loaded {count} messages for {conversation_id}");
                            self.notify(ChatUpdate::HistoryLoaded {
                                conversation_id: conversation_id.clone(),
                                count,
                            });
                            self.notify(ChatUpdate::MessagesChanged { conversation_id });
                        }
                    }
                    Err(e) => {
                        if self.reconciler.history_failed(&ticket) {
                            warn!("[CHAT] history load for {conversation_id} failed: {e}");
                            self.notify(ChatUpdate::HistoryFailed {
                                conversation_id: conversation_id.clone(),
                                error: e.to_string(),
                            });
                            self.notify(ChatUpdate::MessagesChanged { conversation_id });
                        } else {
                            debug!("[CHAT] stale history failure for {conversation_id}: {e}");
                        }
                    }
                }
            }

            Completion::Sent {
                conversation_id,
                local_ref,
                result,
            } => match result {
                Ok(Some(persisted)) => {
                    let outcome = self.reconciler.handle_event(ChatEvent::NewMessage(persisted));
                    debug!("[CHAT] send {local_ref} confirmed: {outcome:?}");
                    if outcome.changed_log() {
                        self.notify(ChatUpdate::MessagesChanged { conversation_id });
                    }
                }
                Ok(None) => debug!("[CHAT] send {local_ref} emitted"),
                Err(e) => {
                    warn!("[CHAT] send {local_ref} to {conversation_id} failed: {e}");
                    if self.reconciler.store_mut().mark_send_failed(&local_ref) {
                        self.notify(ChatUpdate::MessagesChanged {
                            conversation_id: conversation_id.clone(),
                        });
                    }
                    self.notify(ChatUpdate::SendFailed {
                        conversation_id,
                        local_ref,
                        error: e.to_string(),
                    });
                }
            },

            Completion::Reacted {
                conversation_id,
                message_id,
                user_id,
                emoji,
                result,
                reply,
            } => {
                if result.is_ok() {
                    let outcome = self.reconciler.handle_event(ChatEvent::ReactionUpdated {
                        conversation_id: Some(conversation_id.clone()),
                        message_id,
                        user_id,
                        emoji,
                    });
                    if outcome.changed_log() {
                        self.notify(ChatUpdate::MessagesChanged { conversation_id });
                    }
                }
                let _ = reply.send(result);
            }

            Completion::MessageDeleted {
                conversation_id,
                message_id,
                result,
                reply,
            } => {
                if result.is_ok() {
                    let outcome = self.reconciler.handle_event(ChatEvent::MessageDeleted {
                        conversation_id: Some(conversation_id.clone()),
                        message_id,
                    });
                    if outcome.changed_log() {
                        self.notify(ChatUpdate::MessagesChanged { conversation_id });
                    }
                }
                let _ = reply.send(result);
            }

            Completion::ConversationDeleted {
                conversation_id,
                result,
                reply,
            } => {
                if result.is_ok() {
                    info!("[CHAT] deleted conversation {conversation_id}");
                    let was_active = self.directory.remove_conversation(&conversation_id)
                        || self.reconciler.active() == Some(&conversation_id);
                    if was_active {
                        self.reconciler.deselect();
                        self.notify(ChatUpdate::SelectionChanged { active: None });
                    }
                    self.notify(ChatUpdate::DirectoryChanged);
                }
                let _ = reply.send(result);
            }
        }
    }

    // ── Push channel ─────────────────────────────────────────────

    async fn handle_channel_event(&mut self, item: ChannelEvent) {
        match item {
            ChannelEvent::Event(event) => {
                debug!("[CHAT] inbound {}", event.kind());
                if let ChatEvent::NewMessage(message) = &event {
                    if self.directory.note_message(message) {
                        self.notify(ChatUpdate::DirectoryChanged);
                    } else if self.config.refresh_on_unknown_conversation {
                        debug!(
                            "[CHAT] message for unknown conversation {}, refreshing",
                            message.conversation_id
                        );
                        self.start_directory_refresh();
                    }
                }

                let scope = self.reconciler.active().cloned();
                let outcome = self.reconciler.handle_event(event);
                if outcome.changed_log() {
                    if let Some(conversation_id) = scope {
                        self.notify(ChatUpdate::MessagesChanged { conversation_id });
                    }
                }
            }
            ChannelEvent::Reconnected => {
                info!("[CHAT] push channel reconnected");
                self.notify(ChatUpdate::ConnectionChanged { connected: true });
                if let Some(active) = self.reconciler.active().cloned() {
                    if let Err(e) = self.channel.join_conversation(&active).await {
                        warn!("[CHAT] failed to rejoin {active}: {e}");
                    }
                }
                self.start_directory_refresh();
            }
            ChannelEvent::Disconnected { reason } => {
                warn!("[CHAT] push channel disconnected: {reason}");
                self.notify(ChatUpdate::ConnectionChanged { connected: false });
            }
        }
    }

    fn notify(&self, update: ChatUpdate) {
        if let Err(e) = self.update_tx.try_send(update) {
            debug!("[CHAT] dropping UI update: {e}");
        }
    }
}
