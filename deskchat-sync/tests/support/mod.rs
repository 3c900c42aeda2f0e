#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use deskchat_sync::{
    ChannelEvent, ChatApi, ChatError, ChatHandle, ChatResult, ChatSnapshot, PushChannel,
};
use deskchat_types::conversation::Participant;
use deskchat_types::{
    Conversation, ConversationHistory, ConversationId, Message, MessageId, Operator,
    OutboundFrame, OutboundMessage, UserId,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, oneshot};

// ── Fixtures ────────────────────────────────────────────────────

pub const OPERATOR: &str = "op";

pub fn operator() -> UserId {
    UserId::new(OPERATOR)
}

pub fn operator_identity() -> Operator {
    Operator::new(OPERATOR, "Support Desk")
}

pub fn cid(id: &str) -> ConversationId {
    ConversationId::new(id)
}

pub fn mid(id: &str) -> MessageId {
    MessageId::new(id)
}

pub fn uid(id: &str) -> UserId {
    UserId::new(id)
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + ChronoDuration::seconds(secs)
}

pub fn confirmed(id: &str, conv: &str, sender: &str, content: &str) -> Message {
    Message::confirmed(mid(id), cid(conv), uid(sender), content, t0())
}

pub fn echo(conv: &str, sender: &str, content: &str) -> Message {
    Message::optimistic(cid(conv), uid(sender), content, t0())
}

/// A conversation between the operator and `peer`.
pub fn conversation(id: &str, peer: &str, peer_name: &str) -> Conversation {
    Conversation::from_participants(
        cid(id),
        vec![
            Participant {
                id: operator(),
                name: Some("Operator".into()),
                avatar: None,
            },
            Participant {
                id: uid(peer),
                name: Some(peer_name.into()),
                avatar: Some(format!("https://cdn.test/{peer}.png")),
            },
        ],
        None,
        &operator(),
    )
}

/// A conversation the operator does not take part in.
pub fn foreign_conversation(id: &str) -> Conversation {
    Conversation::from_participants(
        cid(id),
        vec![
            Participant {
                id: uid("u1"),
                name: None,
                avatar: None,
            },
            Participant {
                id: uid("u2"),
                name: None,
                avatar: None,
            },
        ],
        None,
        &operator(),
    )
}

// ── Mock API ────────────────────────────────────────────────────

/// In-memory pull API. History requests can be held open with a gate to
/// control the order in which responses reach the session.
pub struct MockApi {
    conversations: Mutex<Vec<Conversation>>,
    histories: Mutex<HashMap<ConversationId, Vec<Message>>>,
    gates: Mutex<HashMap<ConversationId, oneshot::Receiver<()>>>,
    /// Call log, e.g. `"get_conversation c1"`.
    pub calls: Mutex<Vec<String>>,
    pub posted: Mutex<Vec<OutboundMessage>>,
    pub fail_list: AtomicBool,
    pub fail_history: AtomicBool,
    pub fail_post: AtomicBool,
    pub fail_reaction: AtomicBool,
    pub fail_delete: AtomicBool,
    next_id: AtomicUsize,
}

impl MockApi {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        Self {
            conversations: Mutex::new(conversations),
            histories: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            posted: Mutex::new(Vec::new()),
            fail_list: AtomicBool::new(false),
            fail_history: AtomicBool::new(false),
            fail_post: AtomicBool::new(false),
            fail_reaction: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            next_id: AtomicUsize::new(1),
        }
    }

    pub async fn set_history(&self, id: &str, messages: Vec<Message>) {
        self.histories.lock().await.insert(cid(id), messages);
    }

    pub async fn set_conversations(&self, conversations: Vec<Conversation>) {
        *self.conversations.lock().await = conversations;
    }

    /// Holds the next history response for `id` until the returned sender
    /// fires (or is dropped).
    pub async fn gate_history(&self, id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().await.insert(cid(id), rx);
        tx
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub async fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    async fn record(&self, call: String) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl ChatApi for MockApi {
    async fn list_conversations(&self) -> ChatResult<Vec<Conversation>> {
        self.record("list_conversations".into()).await;
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ChatError::Api("list failed".into()));
        }
        Ok(self.conversations.lock().await.clone())
    }

    async fn get_conversation(&self, id: &ConversationId) -> ChatResult<ConversationHistory> {
        self.record(format!("get_conversation {id}")).await;
        let gate = self.gates.lock().await.remove(id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(ChatError::Api("history failed".into()));
        }
        let conversation = self
            .conversations
            .lock()
            .await
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .unwrap_or_else(|| Conversation::from_participants(id.clone(), vec![], None, &operator()));
        let messages = self
            .histories
            .lock()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default();
        Ok(ConversationHistory {
            conversation,
            messages,
        })
    }

    async fn post_message(&self, message: &OutboundMessage) -> ChatResult<Message> {
        self.record(format!("post_message {}", message.conversation_id))
            .await;
        if self.fail_post.load(Ordering::SeqCst) {
            return Err(ChatError::Api("post failed".into()));
        }
        self.posted.lock().await.push(message.clone());
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(Message::confirmed(
            MessageId::new(format!("srv-{n}")),
            message.conversation_id.clone(),
            message.sender_id.clone(),
            message.content.clone(),
            Utc::now(),
        ))
    }

    async fn delete_conversation(&self, id: &ConversationId) -> ChatResult<()> {
        self.record(format!("delete_conversation {id}")).await;
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(ChatError::Api("delete failed".into()));
        }
        self.conversations.lock().await.retain(|c| &c.id != id);
        Ok(())
    }

    async fn post_reaction(
        &self,
        message_id: &MessageId,
        user_id: &UserId,
        emoji: &str,
    ) -> ChatResult<()> {
        self.record(format!("post_reaction {message_id} {user_id} {emoji}"))
            .await;
        if self.fail_reaction.load(Ordering::SeqCst) {
            return Err(ChatError::Api("reaction failed".into()));
        }
        Ok(())
    }

    async fn delete_message(&self, message_id: &MessageId) -> ChatResult<()> {
        self.record(format!("delete_message {message_id}")).await;
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(ChatError::Api("delete failed".into()));
        }
        Ok(())
    }
}

// ── Mock push channel ───────────────────────────────────────────

/// Push channel fed by the test through the sender returned from `new`.
pub struct MockPushChannel {
    inbound: Mutex<mpsc::Receiver<ChannelEvent>>,
    /// Frames emitted by the session, in order.
    pub emitted: Mutex<Vec<OutboundFrame>>,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub connected: AtomicBool,
    pub fail_connect: AtomicBool,
    pub fail_emit: AtomicBool,
}

impl MockPushChannel {
    pub fn new() -> (Self, mpsc::Sender<ChannelEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let channel = Self {
            inbound: Mutex::new(rx),
            emitted: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            connected: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            fail_emit: AtomicBool::new(false),
        };
        (channel, tx)
    }

    pub async fn emitted(&self) -> Vec<OutboundFrame> {
        self.emitted.lock().await.clone()
    }

    pub async fn joins(&self) -> Vec<ConversationId> {
        self.emitted
            .lock()
            .await
            .iter()
            .filter_map(|f| match f {
                OutboundFrame::JoinConversation(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl PushChannel for MockPushChannel {
    async fn connect(&self) -> ChatResult<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ChatError::Transport("connection refused".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> ChatResult<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn emit(&self, frame: OutboundFrame) -> ChatResult<()> {
        if self.fail_emit.load(Ordering::SeqCst) {
            return Err(ChatError::NotConnected);
        }
        self.emitted.lock().await.push(frame);
        Ok(())
    }

    async fn recv(&self) -> Option<ChannelEvent> {
        self.inbound.lock().await.recv().await
    }
}

// ── Helpers ─────────────────────────────────────────────────────

/// Polls snapshots until `pred` holds, panicking after two seconds.
pub async fn eventually<F>(handle: &ChatHandle, what: &str, pred: F) -> ChatSnapshot
where
    F: Fn(&ChatSnapshot) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let snapshot = handle.snapshot().await.expect("session running");
        if pred(&snapshot) {
            return snapshot;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {what}; last snapshot: {snapshot:#?}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Polls until `pred` holds on the API mock.
pub async fn eventually_calls(api: &MockApi, what: &str, prefix: &str, count: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while api.count_calls(prefix).await < count {
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {what}; calls: {:?}", api.calls().await);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn contents(snapshot: &ChatSnapshot) -> Vec<String> {
    snapshot.messages.iter().map(|m| m.content.clone()).collect()
}

pub fn shared(api: MockApi) -> Arc<MockApi> {
    Arc::new(api)
}
