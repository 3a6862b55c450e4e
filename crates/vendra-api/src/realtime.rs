//! Realtime change feed with auto-reconnect.
//!
//! Connects to the backend's realtime websocket (Phoenix channel protocol),
//! joins one `realtime:<table>` topic per watched table with a
//! `postgres_changes` filter, and streams parsed row-change notifications
//! through a [`tokio::sync::broadcast`] channel. Keeps the socket alive with
//! heartbeats and reconnects with exponential backoff + jitter. Every
//! successful re-join is announced with [`RealtimeEvent::Resubscribed`],
//! since changes committed while the socket was down are never replayed.
//!
//! # Example
//!
//! ```rust,ignore
//! use vendra_api::realtime::{RealtimeConfig, RealtimeHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = RealtimeConfig::new(project_url, api_key)
//!     .with_tables(["clients", "projects"]);
//! let cancel = CancellationToken::new();
//!
//! let handle = RealtimeHandle::connect(config, ReconnectConfig::default(), cancel.clone())?;
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     match &*event {
//!         RealtimeEvent::Change(change) => println!("{:?} on {}", change.kind, change.table),
//!         RealtimeEvent::Resubscribed => println!("back online, changes may be missing"),
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Constants ────────────────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;
const PROTOCOL_VERSION: &str = "1.0.0";
const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(30);

// ── ChangeEvent ──────────────────────────────────────────────────────

/// Kind of row change reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    #[serde(other)]
    Other,
}

/// A row-level change notification.
///
/// Only the table and change kind are relied on; the row payload the
/// backend may attach is deliberately not carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Table the change happened in, e.g. `"clients"`.
    pub table: String,

    /// Schema of the table, usually `"public"`.
    #[serde(default)]
    pub schema: String,

    /// Insert / update / delete.
    #[serde(rename = "type")]
    pub kind: ChangeKind,

    /// Commit time reported by the backend, if present.
    #[serde(default)]
    pub commit_timestamp: Option<String>,
}

/// What the realtime feed delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
    /// A row changed in one of the watched tables.
    Change(ChangeEvent),
    /// The socket reconnected and re-joined every topic. Changes made
    /// while it was down were not delivered.
    Resubscribed,
}

// ── RealtimeConfig ───────────────────────────────────────────────────

/// Where and what to subscribe to.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Project base URL (`https://<project>.example.co`).
    pub project_url: Url,
    /// Public API key, sent as the `apikey` query parameter.
    pub api_key: SecretString,
    /// Session token forwarded in the join payload for row-level security.
    pub access_token: Option<SecretString>,
    /// Database schema the watched tables live in.
    pub schema: String,
    /// Tables to watch; one channel topic is joined per table.
    pub tables: Vec<String>,
    /// Keep-alive interval. Default: 30s.
    pub heartbeat_interval: Duration,
}

impl RealtimeConfig {
    pub fn new(project_url: Url, api_key: SecretString) -> Self {
        Self {
            project_url,
            api_key,
            access_token: None,
            schema: "public".into(),
            tables: Vec::new(),
            heartbeat_interval: DEFAULT_HEARTBEAT,
        }
    }

    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_access_token(mut self, token: Option<SecretString>) -> Self {
        self.access_token = token;
        self
    }

    /// `wss://<host>/realtime/v1/websocket?apikey=..&vsn=1.0.0`
    pub fn socket_url(&self) -> Result<Url, Error> {
        let mut url = self.project_url.clone();
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(Error::RealtimeConnect(format!(
                    "unsupported URL scheme '{other}'"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::RealtimeConnect(format!("cannot switch URL to {scheme}")))?;

        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/realtime/v1/websocket"));
        url.query_pairs_mut()
            .clear()
            .append_pair("apikey", self.api_key.expose_secret())
            .append_pair("vsn", PROTOCOL_VERSION);
        Ok(url)
    }
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for socket reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── RealtimeHandle ───────────────────────────────────────────────────

/// Handle to a running realtime subscription.
///
/// Call [`shutdown`](Self::shutdown) (or cancel the token passed to
/// [`connect`](Self::connect)) to tear down the background task.
pub struct RealtimeHandle {
    event_rx: broadcast::Receiver<Arc<RealtimeEvent>>,
    cancel: CancellationToken,
}

impl RealtimeHandle {
    /// Spawn the socket loop for the configured tables.
    ///
    /// Returns as soon as the background task is spawned; the first
    /// connection attempt happens asynchronously.
    pub fn connect(
        config: RealtimeConfig,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let socket_url = config.socket_url()?;
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            socket_loop(socket_url, config, event_tx, reconnect, task_cancel).await;
        });

        Ok(Self { event_rx, cancel })
    }

    /// Get a new receiver for the change stream.
    ///
    /// A consumer that falls behind receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RealtimeEvent>> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// connect → join → read → on error, backoff → reconnect.
async fn socket_loop(
    socket_url: Url,
    config: RealtimeConfig,
    event_tx: broadcast::Sender<Arc<RealtimeEvent>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;
    let mut joined_before = false;

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&socket_url, &config, &event_tx, &mut joined_before, &cancel) => result,
        };

        match result {
            Ok(()) => {
                if cancel.is_cancelled() {
                    break;
                }
                tracing::info!("realtime socket ended cleanly, reconnecting");
                attempt = 0;
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "realtime socket error");

                if reconnect.max_retries.is_some_and(|max| attempt >= max) {
                    tracing::error!(
                        max_retries = reconnect.max_retries,
                        "realtime reconnection limit reached, giving up"
                    );
                    break;
                }

                let delay = calculate_backoff(attempt, &reconnect);
                tracing::info!(
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    attempt,
                    "waiting before reconnect"
                );

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }

                attempt = attempt.saturating_add(1);
            }
        }
    }

    tracing::debug!("realtime loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one socket, join every table topic, then pump frames and
/// heartbeats until the connection drops.
///
/// `joined_before` is set once the topics are joined; on every later
/// join the gap is announced with [`RealtimeEvent::Resubscribed`].
async fn connect_and_read(
    url: &Url,
    config: &RealtimeConfig,
    event_tx: &broadcast::Sender<Arc<RealtimeEvent>>,
    joined_before: &mut bool,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(host = url.host_str().unwrap_or_default(), "connecting to realtime socket");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::RealtimeConnect(e.to_string()))?;

    let (mut write, mut read) = ws_stream.split();
    let mut next_ref: u64 = 1;

    for table in &config.tables {
        let join = join_message(table, &config.schema, config.access_token.as_ref(), next_ref);
        next_ref += 1;
        write
            .send(tungstenite::Message::text(join))
            .await
            .map_err(|e| Error::RealtimeConnect(e.to_string()))?;
        tracing::debug!(table = %table, "joined realtime topic");
    }

    tracing::info!(tables = config.tables.len(), "realtime socket connected");
    if std::mem::replace(joined_before, true) {
        let _ = event_tx.send(Arc::new(RealtimeEvent::Resubscribed));
    }

    let mut heartbeat = tokio::time::interval(config.heartbeat_interval);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            _ = heartbeat.tick() => {
                write
                    .send(tungstenite::Message::text(heartbeat_message(next_ref)))
                    .await
                    .map_err(|e| Error::RealtimeConnect(e.to_string()))?;
                next_ref += 1;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(&text, event_tx);
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        let (code, reason) = frame.map_or((1005, String::new()), |cf| {
                            (u16::from(cf.code), cf.reason.to_string())
                        });
                        return Err(Error::RealtimeClosed { code, reason });
                    }
                    Some(Err(e)) => {
                        return Err(Error::RealtimeConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("realtime stream ended");
                        return Ok(());
                    }
                    Some(Ok(_)) => {
                        // Binary, Ping, Pong, Frame: tungstenite answers pings itself
                    }
                }
            }
        }
    }
}

// ── Protocol messages ────────────────────────────────────────────────

fn join_message(
    table: &str,
    schema: &str,
    access_token: Option<&SecretString>,
    msg_ref: u64,
) -> String {
    let mut payload = serde_json::json!({
        "config": {
            "postgres_changes": [
                { "event": "*", "schema": schema, "table": table }
            ]
        }
    });
    if let Some(token) = access_token {
        payload["access_token"] = serde_json::Value::String(token.expose_secret().to_owned());
    }

    serde_json::json!({
        "topic": format!("realtime:{table}"),
        "event": "phx_join",
        "payload": payload,
        "ref": msg_ref.to_string(),
    })
    .to_string()
}

fn heartbeat_message(msg_ref: u64) -> String {
    serde_json::json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": msg_ref.to_string(),
    })
    .to_string()
}

/// Envelope every Phoenix frame arrives in.
#[derive(Debug, Deserialize)]
struct PhoenixFrame {
    topic: String,
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Parse a text frame and broadcast the row change inside, if any.
fn parse_and_broadcast(text: &str, event_tx: &broadcast::Sender<Arc<RealtimeEvent>>) {
    let frame: PhoenixFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse realtime frame");
            return;
        }
    };

    match frame.event.as_str() {
        "postgres_changes" => {
            match serde_json::from_value::<ChangeEvent>(frame.payload["data"].clone()) {
                Ok(change) => {
                    // No subscribers right now is fine
                    let _ = event_tx.send(Arc::new(RealtimeEvent::Change(change)));
                }
                Err(e) => {
                    tracing::debug!(error = %e, topic = %frame.topic, "malformed change payload");
                }
            }
        }
        "phx_reply" => {
            let status = frame.payload["status"].as_str().unwrap_or("unknown");
            if status != "ok" {
                tracing::warn!(topic = %frame.topic, status, "realtime join rejected");
            }
        }
        "phx_error" | "phx_close" => {
            tracing::warn!(topic = %frame.topic, event = %frame.event, "realtime channel error");
        }
        _ => {
            tracing::trace!(topic = %frame.topic, event = %frame.event, "realtime frame ignored");
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 +- 0.25)`
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic spread seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

// ── Tests ────────────────────────────────────────────────────────────
