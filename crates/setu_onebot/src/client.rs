use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use setu_core::SetuError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};
use url::Url;
use uuid::Uuid;

use crate::event::{MetaEvent, OneBotEvent, OneBotResponse, SendMessageAction, SendMessageParams};
use crate::message::{IncomingMessage, Target};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Actions waiting for their response, keyed by `echo`.
type Pending = Arc<StdMutex<HashMap<String, oneshot::Sender<OneBotResponse>>>>;

/// How long an action may wait for the implementation's response.
const ACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Forward WebSocket connection to a OneBot v11 implementation.
///
/// Cloning is cheap; every clone feeds the same connection task.
#[derive(Clone)]
pub struct OneBotClient {
    tx: mpsc::Sender<String>, // Channel to send outgoing actions to WS task
    pending: Pending,
    connected: Arc<AtomicBool>,
    action_timeout: Duration,
}

impl OneBotClient {
    pub fn new(url: &str, access_token: Option<&str>) -> Result<(Self, mpsc::Receiver<IncomingMessage>)> {
        let ws_url = connect_url(url, access_token)?;
        let (tx, mut rx) = mpsc::channel::<String>(32);
        let (message_tx, message_rx) = mpsc::channel::<IncomingMessage>(32);

        let client = Self {
            tx,
            pending: Pending::default(),
            connected: Arc::new(AtomicBool::new(false)),
            action_timeout: ACTION_TIMEOUT,
        };
        let pending = client.pending.clone();
        let connected = client.connected.clone();

        // Spawn the WebSocket handler task
        tokio::spawn(async move {
            let mut retry_count = 0;
            loop {
                tracing::info!("Connecting to OneBot at {}...", redact(&ws_url));
                match connect_async(&ws_url).await {
                    Ok((ws_stream, _)) => {
                        tracing::info!("Connected to OneBot!");
                        retry_count = 0;
                        connected.store(true, Ordering::Release);
                        if let Err(e) = Self::handle_connection(ws_stream, &mut rx, &message_tx, &pending).await {
                            tracing::error!("OneBot connection error: {}", e);
                        }
                        connected.store(false, Ordering::Release);
                        // Waiters see the dropped sender as a disconnect.
                        pending.lock().unwrap_or_else(|e| e.into_inner()).clear();
                        while rx.try_recv().is_ok() {}
                    }
                    Err(e) => {
                        let wait_secs = 5u64.min(2u64.pow(retry_count));
                        tracing::error!("Failed to connect to OneBot: {}. Retrying in {}s...", e, wait_secs);
                        tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                        if retry_count < 6 { retry_count += 1; }
                    }
                }
                if message_tx.is_closed() {
                    tracing::info!("Message receiver dropped, stopping OneBot connection task");
                    break;
                }
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        });

        Ok((client, message_rx))
    }

    async fn handle_connection(
        stream: WsStream,
        rx: &mut mpsc::Receiver<String>,
        message_tx: &mpsc::Sender<IncomingMessage>,
        pending: &Pending,
    ) -> Result<()> {
        let (mut write, mut read) = stream.split();

        loop {
            tokio::select! {
                incoming = read.next() => {
                    let Some(msg) = incoming else {
                        anyhow::bail!("connection closed by peer");
                    };
                    if let Message::Text(text) = msg? {
                        match parse_frame(&text) {
                            Frame::Message(message) => {
                                if message_tx.send(message).await.is_err() {
                                    return Ok(());
                                }
                            }
                            Frame::Response(resp) => complete(pending, resp),
                            Frame::Ignored => {}
                        }
                    }
                }

                // Outgoing actions (from send_to)
                Some(json_payload) = rx.recv() => {
                    write.send(Message::Text(json_payload)).await?;
                }
            }
        }
    }

    /// Send a message to `target` and wait for the implementation to accept it.
    pub async fn send_to(&self, target: Target, message: &str) -> Result<(), SetuError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(SetuError::Disconnected);
        }

        let echo = Uuid::new_v4().to_string();
        let json = serde_json::to_string(&send_action(target, message, &echo))
            .map_err(|e| SetuError::Send(e.to_string()))?;

        let (done_tx, done_rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(echo.clone(), done_tx);

        if self.tx.send(json).await.is_err() {
            self.forget(&echo);
            return Err(SetuError::Disconnected);
        }

        match tokio::time::timeout(self.action_timeout, done_rx).await {
            Ok(Ok(resp)) if resp.retcode == 0 => Ok(()),
            Ok(Ok(resp)) => Err(SetuError::Send(format!(
                "retcode {}: {}",
                resp.retcode,
                resp.reason()
            ))),
            Ok(Err(_)) => Err(SetuError::Disconnected),
            Err(_) => {
                self.forget(&echo);
                Err(SetuError::Send(format!(
                    "no response within {}s",
                    self.action_timeout.as_secs_f32()
                )))
            }
        }
    }

    fn forget(&self, echo: &str) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(echo);
    }
}

fn send_action(target: Target, message: &str, echo: &str) -> SendMessageAction {
    let (action, message_type, user_id, group_id) = match target {
        Target::Private(user_id) => ("send_private_msg", "private", Some(user_id), None),
        Target::Group(group_id) => ("send_group_msg", "group", None, Some(group_id)),
    };
    SendMessageAction {
        action: action.to_string(),
        params: SendMessageParams {
            message_type: message_type.to_string(),
            user_id,
            group_id,
            message: message.to_string(),
        },
        echo: echo.to_string(),
    }
}

/// Hand a response to whoever is waiting on its `echo`.
fn complete(pending: &Pending, resp: OneBotResponse) {
    let Some(echo) = resp.echo.clone() else {
        return;
    };
    let waiter = pending
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .remove(&echo);
    match waiter {
        Some(done) => {
            let _ = done.send(resp);
        }
        None => tracing::debug!("Response for unknown or expired action {}", echo),
    }
}

/// Build the connect URL, carrying the token as `access_token`.
fn connect_url(url: &str, access_token: Option<&str>) -> Result<Url> {
    let mut ws_url = Url::parse(url).context("Invalid OneBot WS URL")?;
    if let Some(token) = access_token.filter(|t| !t.is_empty()) {
        ws_url.query_pairs_mut().append_pair("access_token", token);
    }
    Ok(ws_url)
}

/// URL without the query string, for logs.
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

/// One decoded text frame.
enum Frame {
    Message(IncomingMessage),
    Response(OneBotResponse),
    Ignored,
}

fn parse_frame(text: &str) -> Frame {
    match serde_json::from_str::<OneBotEvent>(text) {
        Ok(OneBotEvent::Message(ev)) => Frame::Message(ev.into()),
        Ok(OneBotEvent::Meta(MetaEvent::Lifecycle { sub_type })) => {
            tracing::info!("OneBot lifecycle: {}", sub_type);
            Frame::Ignored
        }
        Ok(OneBotEvent::Meta(MetaEvent::Heartbeat { interval })) => {
            tracing::trace!("OneBot heartbeat, next in {}ms", interval);
            Frame::Ignored
        }
        Ok(_) => Frame::Ignored,
        Err(_) => match serde_json::from_str::<OneBotResponse>(text) {
            Ok(resp) => {
                if resp.retcode != 0 {
                    tracing::warn!(
                        "OneBot action {} failed (retcode {}): {}",
                        resp.echo.as_deref().unwrap_or("-"),
                        resp.retcode,
                        resp.reason()
                    );
                }
                Frame::Response(resp)
            }
            Err(_) => {
                tracing::debug!("Ignored unrecognised OneBot frame");
                Frame::Ignored
            }
        },
    }
}
