//! WebSocket push channel.
//!
//! One connection per session. `connect` dials once and reports the result;
//! either way a driver task then owns the socket:
//! - decodes inbound text frames into `ChannelEvent::Event`, dropping
//!   frames that fail validation
//! - writes frames queued by `emit`
//! - on a drop, reports `Disconnected`, redials with exponential backoff
//!   and reports `Reconnected` (room membership must be re-established by
//!   the consumer)
//! - if the first dial failed, keeps dialing with the same backoff and
//!   reports `Reconnected` once it gets through
//!
//! When the driver gives up or `disconnect` is called, `recv` returns
//! `None`.

use crate::config::NetConfig;
use crate::error::{NetError, NetResult};
use async_trait::async_trait;
use chrono::Utc;
use deskchat_sync::{ChannelEvent, ChatResult, PushChannel};
use deskchat_types::OutboundFrame;
use deskchat_types::wire::{decode_event, encode_frame};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_BUFFER: usize = 256;
const OUTBOUND_BUFFER: usize = 64;

/// Why a connection ended.
enum Exit {
    Stopped,
    Lost(String),
}

/// [`PushChannel`] over a WebSocket carrying `{ event, data }` JSON frames.
pub struct WsPushChannel {
    config: NetConfig,
    connected: Arc<AtomicBool>,
    /// Taken by the driver on connect; dropping it ends `recv`.
    events_tx: std::sync::Mutex<Option<mpsc::Sender<ChannelEvent>>>,
    events_rx: Mutex<mpsc::Receiver<ChannelEvent>>,
    outbound_tx: std::sync::Mutex<Option<mpsc::Sender<String>>>,
    stop_tx: watch::Sender<bool>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl WsPushChannel {
    pub fn new(config: NetConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (stop_tx, _) = watch::channel(false);
        Self {
            config,
            connected: Arc::new(AtomicBool::new(false)),
            events_tx: std::sync::Mutex::new(Some(events_tx)),
            events_rx: Mutex::new(events_rx),
            outbound_tx: std::sync::Mutex::new(None),
            stop_tx,
            driver: Mutex::new(None),
        }
    }

    /// Dials the push endpoint and starts the driver.
    ///
    /// A failed first dial is returned as an error, but the driver keeps
    /// redialing in the background.
    pub async fn open(&self) -> NetResult<()> {
        let Some(events_tx) = self.take_events_tx() else {
            return Err(NetError::Config("push channel already started".into()));
        };

        let (ws, result) = match dial(&self.config).await {
            Ok(ws) => {
                info!("push channel connected to {}", self.config.push_url);
                (Some(ws), Ok(()))
            }
            Err(e) => {
                warn!(
                    "push channel unavailable at {}, retrying in background: {e}",
                    self.config.push_url
                );
                (None, Err(e))
            }
        };

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        if let Ok(mut slot) = self.outbound_tx.lock() {
            *slot = Some(outbound_tx);
        }
        self.connected.store(ws.is_some(), Ordering::SeqCst);

        let driver = Driver {
            config: self.config.clone(),
            connected: self.connected.clone(),
            events_tx,
            outbound_rx,
            stop_rx: self.stop_tx.subscribe(),
        };
        *self.driver.lock().await = Some(tokio::spawn(driver.run(ws)));
        result
    }

    /// Stops the driver and waits for it to close the socket.
    pub async fn close(&self) -> NetResult<()> {
        let _ = self.stop_tx.send(true);
        self.connected.store(false, Ordering::SeqCst);
        if let Ok(mut slot) = self.outbound_tx.lock() {
            slot.take();
        }
        // Never opened: drop the parked sender so `recv` ends too.
        self.take_events_tx();

        let driver = self.driver.lock().await.take();
        if let Some(driver) = driver {
            if let Err(e) = driver.await {
                warn!("push channel driver ended abnormally: {e}");
            }
        }
        Ok(())
    }

    /// Queues a frame for the socket.
    pub async fn send_frame(&self, frame: &OutboundFrame) -> NetResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(NetError::NotConnected);
        }
        let text = encode_frame(frame)?;
        let tx = self
            .outbound_tx
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
            .ok_or(NetError::NotConnected)?;
        tx.send(text).await.map_err(|_| NetError::NotConnected)
    }

    fn take_events_tx(&self) -> Option<mpsc::Sender<ChannelEvent>> {
        self.events_tx.lock().ok().and_then(|mut slot| slot.take())
    }
}

#[async_trait]
impl PushChannel for WsPushChannel {
    async fn connect(&self) -> ChatResult<()> {
        Ok(self.open().await?)
    }

    async fn disconnect(&self) -> ChatResult<()> {
        Ok(self.close().await?)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn emit(&self, frame: OutboundFrame) -> ChatResult<()> {
        Ok(self.send_frame(&frame).await?)
    }

    async fn recv(&self) -> Option<ChannelEvent> {
        self.events_rx.lock().await.recv().await
    }
}

async fn dial(config: &NetConfig) -> NetResult<WsStream> {
    let mut request = config.push_url.as_str().into_client_request()?;
    if let Some(token) = &config.bearer_token {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| NetError::Config(format!("invalid bearer token: {e}")))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }
    let (ws, _response) = connect_async(request).await?;
    Ok(ws)
}

// ── Driver ──────────────────────────────────────────────────────

struct Driver {
    config: NetConfig,
    connected: Arc<AtomicBool>,
    events_tx: mpsc::Sender<ChannelEvent>,
    outbound_rx: mpsc::Receiver<String>,
    stop_rx: watch::Receiver<bool>,
}

impl Driver {
    async fn run(mut self, initial: Option<WsStream>) {
        let mut next = match initial {
            Some(ws) => Some(ws),
            None => self.reconnect().await,
        };

        while let Some(ws) = next.take() {
            let reason = match self.pump(ws).await {
                Exit::Stopped => break,
                Exit::Lost(reason) => reason,
            };

            self.connected.store(false, Ordering::SeqCst);
            warn!("push channel lost: {reason}");
            if self
                .events_tx
                .send(ChannelEvent::Disconnected { reason })
                .await
                .is_err()
            {
                break;
            }
            next = self.reconnect().await;
        }
        self.connected.store(false, Ordering::SeqCst);
        debug!("push channel driver stopped");
    }

    /// Redials and announces the new connection. `None` ends the driver.
    async fn reconnect(&mut self) -> Option<WsStream> {
        let ws = self.redial().await?;
        self.connected.store(true, Ordering::SeqCst);
        self.events_tx.send(ChannelEvent::Reconnected).await.ok()?;
        Some(ws)
    }

    /// Moves frames both ways until the connection ends.
    async fn pump(&mut self, ws: WsStream) -> Exit {
        let (mut sink, mut stream) = ws.split();
        loop {
            tokio::select! {
                _ = self.stop_rx.changed() => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    return Exit::Stopped;
                }
                Some(text) = self.outbound_rx.recv() => {
                    if let Err(e) = sink.send(WsMessage::Text(text.into())).await {
                        return Exit::Lost(e.to_string());
                    }
                }
                msg = stream.next() => match msg {
                    Some(Ok(WsMessage::Text(text))) => match decode_event(&text, Utc::now()) {
                        Ok(event) => {
                            if self.events_tx.send(ChannelEvent::Event(event)).await.is_err() {
                                return Exit::Stopped;
                            }
                        }
                        Err(e) => debug!("dropping push frame: {e}"),
                    },
                    Some(Ok(WsMessage::Close(_))) | None => {
                        return Exit::Lost("closed by server".into());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Exit::Lost(e.to_string()),
                },
            }
        }
    }

    /// Redials with exponential backoff. `None` when stopped or out of
    /// attempts.
    async fn redial(&mut self) -> Option<WsStream> {
        let mut attempt = 0u32;
        loop {
            if let Some(max) = self.config.max_reconnect_attempts {
                if attempt >= max {
                    warn!("push channel giving up after {attempt} reconnect attempts");
                    return None;
                }
            }

            let delay = self.config.reconnect_delay(attempt);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.stop_rx.changed() => return None,
            }

            match dial(&self.config).await {
                Ok(ws) => {
                    info!("push channel reconnected after {} attempts", attempt + 1);
                    return Some(ws);
                }
                Err(e) => debug!("reconnect attempt {} failed: {e}", attempt + 1),
            }
            attempt += 1;
        }
    }
}
