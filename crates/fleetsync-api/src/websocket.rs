//! Push event channel with fixed-delay auto-reconnect.
//!
//! Connects to the panel's WebSocket endpoint and forwards every decoded
//! message, in delivery order, through an [`mpsc`] channel together with
//! connection lifecycle markers. When the socket closes or errors, the loop
//! waits a fixed delay and reconnects, forever, until cancelled.
//!
//! # Example
//!
//! ```rust,ignore
//! use fleetsync_api::websocket::{ChannelEvent, EventChannel, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let url = Url::parse("ws://panel.local:31457/ws")?;
//!
//! let (channel, mut events) = EventChannel::spawn(url, ReconnectConfig::default(), cancel, None);
//!
//! while let Some(event) = events.recv().await {
//!     if let ChannelEvent::Message(raw) = event {
//!         println!("{}", raw.event_type);
//!     }
//! }
//!
//! channel.shutdown();
//! channel.join().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::HeaderValue;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::transport::ADMIN_TOKEN_HEADER;

// ── Channel capacity ─────────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ── RawEvent ─────────────────────────────────────────────────────────

/// One decoded push message: a JSON object with a string `type`.
///
/// The whole object is kept in `body`; classifying the payload is the
/// consumer's job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawEvent {
    /// The `type` discriminator, e.g. `"server_added"`.
    pub event_type: String,

    /// The full message object, `type` included.
    pub body: serde_json::Value,
}

impl RawEvent {
    /// Decode a text frame. Returns `None` for anything that is not a JSON
    /// object carrying a string `type`.
    pub fn parse(text: &str) -> Option<Self> {
        let body: serde_json::Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse WebSocket message");
                return None;
            }
        };

        let Some(event_type) = body.get("type").and_then(serde_json::Value::as_str) else {
            tracing::debug!("WebSocket message has no string `type`, dropping");
            return None;
        };

        Some(Self {
            event_type: event_type.to_owned(),
            body,
        })
    }
}

// ── ChannelEvent / ConnectionState ───────────────────────────────────

/// Everything the channel reports, in the order it happened.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The socket is open.
    Connected,
    /// A decoded push message.
    Message(Arc<RawEvent>),
    /// The socket closed, errored, or could not be opened. A reconnect is
    /// scheduled after the fixed delay.
    Disconnected { reason: String },
}

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Reconnection policy: a fixed delay between attempts, retried forever.
///
/// There is deliberately no backoff or jitter; every attempt waits exactly
/// `delay`.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before each reconnection attempt. Default: 5s.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
        }
    }
}

// ── EventChannel ─────────────────────────────────────────────────────

/// Handle to a running event channel task.
pub struct EventChannel {
    state_rx: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl EventChannel {
    /// Spawn the connect/read/reconnect loop.
    ///
    /// Returns immediately; the first connection attempt happens in the
    /// background. The returned receiver yields [`ChannelEvent`]s in
    /// delivery order. Dropping it stops the loop at its next step.
    ///
    /// If `admin_token` is provided, it's sent as the `X-Admin-Token`
    /// header on every upgrade request.
    pub fn spawn(
        ws_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        admin_token: Option<HeaderValue>,
    ) -> (Self, mpsc::Receiver<ChannelEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            ws_loop(ws_url, event_tx, state_tx, reconnect, task_cancel, admin_token).await;
        });

        (
            Self {
                state_rx,
                cancel,
                task,
            },
            event_rx,
        )
    }

    /// Subscribe to connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Current connection state.
    pub fn current_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait for the background task to exit. Pair with
    /// [`shutdown()`](Self::shutdown), or drop the event receiver first.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "event channel task failed");
        }
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → disconnected → fixed delay → reconnect.
async fn ws_loop(
    ws_url: Url,
    event_tx: mpsc::Sender<ChannelEvent>,
    state_tx: watch::Sender<ConnectionState>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
    admin_token: Option<HeaderValue>,
) {
    let mut attempt: u64 = 0;

    loop {
        state_tx.send_replace(ConnectionState::Connecting);

        let reason = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &event_tx, &state_tx, &cancel, admin_token.as_ref()) => {
                match result {
                    Ok(()) => {
                        tracing::info!("WebSocket disconnected");
                        "connection closed".to_owned()
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "WebSocket error");
                        e.to_string()
                    }
                }
            }
        };

        state_tx.send_replace(ConnectionState::Disconnected);
        if cancel.is_cancelled()
            || event_tx
                .send(ChannelEvent::Disconnected { reason })
                .await
                .is_err()
        {
            break;
        }

        attempt += 1;
        tracing::info!(
            delay_ms = u64::try_from(reconnect.delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "Waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(reconnect.delay) => {}
        }
    }

    state_tx.send_replace(ConnectionState::Disconnected);
    tracing::debug!("WebSocket loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish a single WebSocket connection, read messages until it drops.
async fn connect_and_read(
    url: &Url,
    event_tx: &mpsc::Sender<ChannelEvent>,
    state_tx: &watch::Sender<ConnectionState>,
    cancel: &CancellationToken,
    admin_token: Option<&HeaderValue>,
) -> Result<(), Error> {
    tracing::info!(url = %url, "Connecting to WebSocket");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    if let Some(token) = admin_token.and_then(|v| v.to_str().ok()) {
        request = request.with_header(ADMIN_TOKEN_HEADER, token);
    }

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("WebSocket connected");
    state_tx.send_replace(ConnectionState::Connected);
    if event_tx.send(ChannelEvent::Connected).await.is_err() {
        return Ok(());
    }

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            () = event_tx.closed() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        let Some(raw) = RawEvent::parse(&text) else { continue };
                        if event_tx.send(ChannelEvent::Message(Arc::new(raw))).await.is_err() {
                            return Ok(());
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite answers pings on the next read/flush
                        tracing::trace!("WebSocket ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        return match frame {
                            Some(cf) if cf.code != tungstenite::protocol::frame::coding::CloseCode::Normal => {
                                Err(Error::WebSocketClosed {
                                    code: u16::from(cf.code),
                                    reason: cf.reason.to_string(),
                                })
                            }
                            _ => {
                                tracing::info!("WebSocket close frame received");
                                Ok(())
                            }
                        };
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        // Stream ended without a close frame
                        tracing::info!("WebSocket stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

/// Derive the event channel URL from the panel base URL:
/// `http → ws`, `https → wss`, with `path` appended to any base path.
pub fn event_channel_url(base_url: &Url, path: &str) -> Result<Url, Error> {
    let scheme = match base_url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(Error::WebSocketConnect(format!(
                "unsupported URL scheme '{other}'"
            )));
        }
    };

    let mut url = base_url.clone();
    url.set_scheme(scheme)
        .map_err(|()| Error::WebSocketConnect(format!("cannot use scheme '{scheme}'")))?;

    let base_path = url.path().trim_end_matches('/').to_owned();
    let suffix = path.trim_start_matches('/');
    url.set_path(&format!("{base_path}/{suffix}"));
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

// ── Tests ────────────────────────────────────────────────────────────
