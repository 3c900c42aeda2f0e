use deskchat_net::{NetConfig, WsPushChannel};
use deskchat_sync::{ChannelEvent, ChatError, PushChannel};
use deskchat_types::{ChatEvent, ConversationId, MessageId, OutboundFrame, OutboundMessage, UserId};
use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

// ── Loopback server ─────────────────────────────────────────────

/// Server side of one accepted connection. Dropping `outgoing` closes it.
struct Peer {
    outgoing: mpsc::Sender<WsMessage>,
    incoming: mpsc::Receiver<String>,
}

impl Peer {
    async fn push(&self, event: &str, data: serde_json::Value) {
        let frame = serde_json::json!({ "event": event, "data": data });
        self.outgoing
            .send(WsMessage::text(frame.to_string()))
            .await
            .unwrap();
    }

    async fn push_raw(&self, text: &str) {
        self.outgoing.send(WsMessage::text(text)).await.unwrap();
    }

    async fn next_frame(&mut self) -> serde_json::Value {
        let text = tokio::time::timeout(Duration::from_secs(2), self.incoming.recv())
            .await
            .expect("timed out waiting for client frame")
            .expect("connection closed");
        serde_json::from_str(&text).unwrap()
    }
}

async fn spawn_server() -> (String, mpsc::Receiver<Peer>, JoinHandle<()>) {
    spawn_server_on(TcpListener::bind("127.0.0.1:0").await.unwrap())
}

fn spawn_server_on(listener: TcpListener) -> (String, mpsc::Receiver<Peer>, JoinHandle<()>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let addr = listener.local_addr().unwrap();
    let (peers_tx, peers_rx) = mpsc::channel(8);

    let acceptor = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let Ok(ws) = accept_async(stream).await else {
                continue;
            };
            let (mut sink, mut source) = ws.split();
            let (out_tx, mut out_rx) = mpsc::channel::<WsMessage>(16);
            let (in_tx, in_rx) = mpsc::channel::<String>(16);

            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        msg = out_rx.recv() => match msg {
                            Some(msg) => {
                                if sink.send(msg).await.is_err() {
                                    break;
                                }
                            }
                            None => {
                                let _ = sink.close().await;
                                break;
                            }
                        },
                        frame = source.next() => match frame {
                            Some(Ok(WsMessage::Text(text))) => {
                                let _ = in_tx.send(text.to_string()).await;
                            }
                            Some(Ok(_)) => {}
                            _ => break,
                        },
                    }
                }
            });

            let peer = Peer {
                outgoing: out_tx,
                incoming: in_rx,
            };
            if peers_tx.send(peer).await.is_err() {
                break;
            }
        }
    });

    (format!("ws://{addr}"), peers_rx, acceptor)
}

fn config(url: &str) -> NetConfig {
    NetConfig {
        push_url: url.to_string(),
        reconnect_base_delay_ms: 10,
        reconnect_max_delay_ms: 50,
        max_reconnect_attempts: Some(3),
        ..NetConfig::default()
    }
}

async fn next_peer(peers: &mut mpsc::Receiver<Peer>) -> Peer {
    tokio::time::timeout(Duration::from_secs(2), peers.recv())
        .await
        .expect("timed out waiting for connection")
        .expect("server stopped")
}

async fn next_event(channel: &WsPushChannel) -> Option<ChannelEvent> {
    tokio::time::timeout(Duration::from_secs(2), channel.recv())
        .await
        .expect("timed out waiting for channel event")
}

// ── Tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn emits_frames_in_wire_format() {
    let (url, mut peers, _server) = spawn_server().await;
    let channel = WsPushChannel::new(config(&url));
    channel.connect().await.unwrap();
    assert!(channel.is_connected());
    let mut peer = next_peer(&mut peers).await;

    channel
        .join_conversation(&ConversationId::new("c1"))
        .await
        .unwrap();
    assert_eq!(
        peer.next_frame().await,
        serde_json::json!({ "event": "join chat", "data": "c1" })
    );

    channel
        .emit(OutboundFrame::SendMessage(OutboundMessage {
            conversation_id: ConversationId::new("c1"),
            sender_id: UserId::new("op"),
            content: "hi".into(),
        }))
        .await
        .unwrap();
    assert_eq!(
        peer.next_frame().await,
        serde_json::json!({
            "event": "send message",
            "data": { "chatId": "c1", "senderId": "op", "content": "hi" }
        })
    );
}

#[tokio::test]
async fn inbound_frames_become_events() {
    let (url, mut peers, _server) = spawn_server().await;
    let channel = WsPushChannel::new(config(&url));
    channel.connect().await.unwrap();
    let peer = next_peer(&mut peers).await;

    peer.push(
        "new message",
        serde_json::json!({
            "chatId": "c1",
            "message": { "_id": "m1", "sender": "alice", "content": "hello" }
        }),
    )
    .await;

    match next_event(&channel).await {
        Some(ChannelEvent::Event(ChatEvent::NewMessage(message))) => {
            assert_eq!(message.id, Some(MessageId::new("m1")));
            assert_eq!(message.conversation_id, ConversationId::new("c1"));
            assert_eq!(message.content, "hello");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_frames_are_dropped() {
    let (url, mut peers, _server) = spawn_server().await;
    let channel = WsPushChannel::new(config(&url));
    channel.connect().await.unwrap();
    let peer = next_peer(&mut peers).await;

    peer.push_raw("not json").await;
    peer.push("typing", serde_json::json!({ "chatId": "c1" })).await;
    peer.push("message deleted", serde_json::json!({})).await;
    peer.push("message deleted", serde_json::json!({ "messageId": "m1" }))
        .await;

    assert_eq!(
        next_event(&channel).await,
        Some(ChannelEvent::Event(ChatEvent::MessageDeleted {
            conversation_id: None,
            message_id: MessageId::new("m1"),
        }))
    );
}

#[tokio::test]
async fn emit_before_connect_fails() {
    let channel = WsPushChannel::new(NetConfig::default());
    let err = channel
        .emit(OutboundFrame::JoinConversation(ConversationId::new("c1")))
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotConnected));
}

#[tokio::test]
async fn connect_to_closed_port_fails() {
    let channel = WsPushChannel::new(config("ws://127.0.0.1:9"));
    let err = channel.connect().await.unwrap_err();
    assert!(matches!(err, ChatError::Transport(_)));
    assert!(!channel.is_connected());

    // Background redials run out of attempts and end the stream.
    assert_eq!(next_event(&channel).await, None);
}

#[tokio::test]
async fn connects_when_server_comes_up_after_failed_connect() {
    let reserved = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = reserved.local_addr().unwrap();
    drop(reserved);

    let channel = WsPushChannel::new(NetConfig {
        max_reconnect_attempts: Some(100),
        ..config(&format!("ws://{addr}"))
    });
    let err = channel.connect().await.unwrap_err();
    assert!(matches!(err, ChatError::Transport(_)));
    assert!(!channel.is_connected());

    let (_url, mut peers, _server) = spawn_server_on(TcpListener::bind(addr).await.unwrap());
    let mut peer = next_peer(&mut peers).await;
    assert_eq!(next_event(&channel).await, Some(ChannelEvent::Reconnected));
    assert!(channel.is_connected());

    channel
        .join_conversation(&ConversationId::new("c1"))
        .await
        .unwrap();
    assert_eq!(peer.next_frame().await["event"], "join chat");

    channel.disconnect().await.unwrap();
    assert_eq!(next_event(&channel).await, None);
}

#[tokio::test]
async fn disconnect_stops_background_redial() {
    let channel = WsPushChannel::new(NetConfig {
        max_reconnect_attempts: None,
        ..config("ws://127.0.0.1:9")
    });
    assert!(channel.connect().await.is_err());

    channel.disconnect().await.unwrap();
    assert_eq!(next_event(&channel).await, None);
    assert!(!channel.is_connected());
}

#[tokio::test]
async fn reconnects_after_server_drop() {
    let (url, mut peers, _server) = spawn_server().await;
    let channel = WsPushChannel::new(config(&url));
    channel.connect().await.unwrap();

    let first = next_peer(&mut peers).await;
    drop(first);

    assert!(matches!(
        next_event(&channel).await,
        Some(ChannelEvent::Disconnected { .. })
    ));
    let mut second = next_peer(&mut peers).await;
    assert_eq!(next_event(&channel).await, Some(ChannelEvent::Reconnected));
    assert!(channel.is_connected());

    channel
        .join_conversation(&ConversationId::new("c1"))
        .await
        .unwrap();
    assert_eq!(second.next_frame().await["event"], "join chat");
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let (url, mut peers, server) = spawn_server().await;
    let channel = WsPushChannel::new(config(&url));
    channel.connect().await.unwrap();

    let peer = next_peer(&mut peers).await;
    server.abort();
    let _ = server.await;
    drop(peer);

    assert!(matches!(
        next_event(&channel).await,
        Some(ChannelEvent::Disconnected { .. })
    ));
    assert_eq!(next_event(&channel).await, None);
    assert!(!channel.is_connected());
}

#[tokio::test]
async fn disconnect_closes_socket_and_ends_recv() {
    let (url, mut peers, _server) = spawn_server().await;
    let channel = WsPushChannel::new(config(&url));
    channel.connect().await.unwrap();
    let mut peer = next_peer(&mut peers).await;

    channel.disconnect().await.unwrap();
    assert!(!channel.is_connected());
    assert_eq!(next_event(&channel).await, None);

    let closed = tokio::time::timeout(Duration::from_secs(2), peer.incoming.recv())
        .await
        .unwrap();
    assert!(closed.is_none());
}

#[tokio::test]
async fn disconnect_without_connect_ends_recv() {
    let channel = WsPushChannel::new(NetConfig::default());
    channel.disconnect().await.unwrap();
    assert_eq!(next_event(&channel).await, None);
}
