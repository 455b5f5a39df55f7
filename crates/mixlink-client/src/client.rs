//! Daemon connection lifecycle, inbound dispatch, and command encoding.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mixlink_core::flatten_snapshot;

use crate::bus::{PatchBus, SubscriptionId};
use crate::codec::{self, Envelope, Inbound, OutboundPayload};
use crate::status::{ConnectionState, Severity, StatusEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Websocket endpoint of the daemon
    pub endpoint: String,
    /// Fixed delay between connect attempts; no backoff growth
    pub retry_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:14564/api/websocket".to_string(),
            retry_interval: Duration::from_secs(5),
        }
    }
}

/// Synchronization client for the mixer daemon.
///
/// Owns the socket lifecycle on a background task, mirrors the daemon's
/// device registry, fans patches out on its [`PatchBus`], and encodes
/// outbound commands. One long-lived instance is handed to each consumer;
/// there is no process-global client.
pub struct MixerClient {
    inner: Arc<ClientInner>,
    /// Token of the current (or most recent) reconnect loop; replaced on
    /// restart, since a cancelled token stays cancelled.
    shutdown: Mutex<CancellationToken>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct ClientInner {
    config: ClientConfig,
    /// Device serials from the most recent snapshot, replaced wholesale.
    /// Only the first entry is addressable by outbound commands.
    devices: Mutex<Vec<String>>,
    bus: PatchBus,
    /// Shared by commands and the initial status request; strictly
    /// increasing across reconnects, never correlated to responses.
    next_id: AtomicU64,
    /// Sender into the current session's write loop; absent while
    /// disconnected.
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    state_tx: watch::Sender<ConnectionState>,
    status_tx: broadcast::Sender<StatusEvent>,
}

impl MixerClient {
    /// Create a client; no connection is attempted until [`Self::start`].
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (status_tx, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(ClientInner {
                config,
                devices: Mutex::new(Vec::new()),
                bus: PatchBus::new(),
                next_id: AtomicU64::new(0),
                outbound: Mutex::new(None),
                state_tx,
                status_tx,
            }),
            shutdown: Mutex::new(CancellationToken::new()),
            task: Mutex::new(None),
        }
    }

    /// Spawn the reconnect loop. Must be called within a tokio runtime.
    /// Calling it again while the loop is running is a no-op; a stopped
    /// client can be started again.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }
        let mut shutdown = self.shutdown.lock();
        if shutdown.is_cancelled() {
            *shutdown = CancellationToken::new();
        }
        let inner = Arc::clone(&self.inner);
        *task = Some(tokio::spawn(run(inner, shutdown.clone())));
    }

    /// Signal the reconnect loop to stop and wait for it to release the
    /// socket. The final published state is `Disconnected`; a subsequent
    /// [`Self::start`] begins a fresh lifecycle.
    pub async fn stop(&self) {
        let task = self.task.lock().take();
        self.shutdown.lock().cancel();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Register a handler that receives every patch.
    pub fn subscribe(
        &self,
        handler: impl Fn(&mixlink_core::Patch) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.bus.subscribe(handler)
    }

    /// Detach a previously registered handler.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.bus.unsubscribe(id);
    }

    /// Send a named command to the first known device.
    ///
    /// One parameter is sent as the bare value, several as an ordered list;
    /// that distinction is the daemon's command schema. The call is a
    /// silent no-op when the name or parameter list is empty, when no
    /// snapshot has been received yet (dropped, not queued), or when the
    /// socket is currently absent. Callers are not notified of delivery
    /// failure.
    pub fn send_command(&self, name: &str, params: Vec<Value>) {
        if name.is_empty() || params.is_empty() {
            return;
        }
        let Some(serial) = self.inner.devices.lock().first().cloned() else {
            debug!(command = name, "No device known yet, dropping command");
            return;
        };

        let mut payload = params;
        let payload = if payload.len() == 1 {
            payload.pop().unwrap_or(Value::Null)
        } else {
            Value::Array(payload)
        };
        let mut body = Map::new();
        body.insert(name.to_string(), payload);

        let envelope = Envelope {
            id: self.inner.next_id(),
            data: OutboundPayload::Command(serial, Value::Object(body)),
        };
        match codec::encode(&envelope) {
            Ok(json) => self.inner.send_raw(&json),
            Err(e) => debug!(command = name, error = %e, "Failed to encode command"),
        }
    }

    /// Serials of the devices known from the most recent snapshot.
    #[must_use]
    pub fn devices(&self) -> Vec<String> {
        self.inner.devices.lock().clone()
    }

    /// The current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state_tx.borrow().clone()
    }

    /// Watch connection state transitions.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Subscribe to `(severity, message)` status notifications.
    #[must_use]
    pub fn status_events(&self) -> broadcast::Receiver<StatusEvent> {
        self.inner.status_tx.subscribe()
    }
}

impl ClientInner {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    fn notify(&self, severity: Severity, message: impl Into<String>) {
        let _ = self.status_tx.send(StatusEvent::new(severity, message));
    }

    /// Hand a serialized frame to the current session, dropping it silently
    /// if the socket is absent or mid-teardown.
    fn send_raw(&self, json: &str) {
        let sender = self.outbound.lock().clone();
        match sender {
            Some(tx) => {
                if tx.send(json.to_string()).is_err() {
                    debug!("Socket went away, dropping outbound frame");
                }
            }
            None => debug!("Not connected, dropping outbound frame"),
        }
    }

    /// Decode one inbound frame and dispatch it. Decode failures are
    /// frame-scoped: logged and dropped.
    fn handle_frame(&self, text: &str) {
        match codec::decode(text) {
            Ok(Some(Inbound::Status(status))) => {
                if let Some(Value::Object(mixers)) = status.get("mixers") {
                    *self.devices.lock() = mixers.keys().cloned().collect();
                }
                for patch in flatten_snapshot(&status) {
                    self.bus.publish(&patch);
                }
            }
            Ok(Some(Inbound::Patches(patches))) => {
                for patch in &patches {
                    self.bus.publish(patch);
                }
            }
            Ok(None) => {}
            Err(e) => debug!(error = %e, "Dropping malformed frame"),
        }
    }
}

/// The reconnect loop: connect, run a session until it ends, sleep the
/// fixed interval, try again. Runs until shutdown is signalled.
async fn run(inner: Arc<ClientInner>, shutdown: CancellationToken) {
    while !shutdown.is_cancelled() {
        inner.set_state(ConnectionState::Connecting);

        match connect_async(inner.config.endpoint.as_str()).await {
            Ok((stream, _)) => {
                info!(endpoint = %inner.config.endpoint, "Connected to mixer daemon");
                inner.set_state(ConnectionState::Connected);
                inner.notify(Severity::Normal, "Connected");

                session(&inner, stream, &shutdown).await;

                inner.outbound.lock().take();
                if !matches!(*inner.state_tx.borrow(), ConnectionState::Error(_)) {
                    inner.set_state(ConnectionState::Disconnected);
                }
            }
            Err(e) => {
                // Routine while the daemon is down; not surfaced as Error.
                debug!(error = %e, "Connect attempt failed");
                inner.set_state(ConnectionState::Disconnected);
                inner.notify(
                    Severity::Warning,
                    "Could not connect to the mixer daemon, is it running on this machine?",
                );
            }
        }

        tokio::select! {
            () = tokio::time::sleep(inner.config.retry_interval) => {}
            () = shutdown.cancelled() => break,
        }
    }

    inner.outbound.lock().take();
    inner.set_state(ConnectionState::Disconnected);
}

/// One connection's lifetime: issue the initial status request, then pump
/// inbound frames and outbound commands until close, error, or shutdown.
async fn session(inner: &Arc<ClientInner>, stream: WsStream, shutdown: &CancellationToken) {
    let (mut write, mut read) = stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    *inner.outbound.lock() = Some(outbound_tx);

    let hello = Envelope { id: inner.next_id(), data: OutboundPayload::GetStatus };
    let Ok(hello) = codec::encode(&hello) else {
        return;
    };
    if write.send(Message::text(hello)).await.is_err() {
        warn!("Failed to send initial status request");
        return;
    }

    loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => inner.handle_frame(text.as_str()),
                Some(Ok(Message::Close(_))) | None => {
                    warn!("Connection to mixer daemon closed");
                    inner.notify(Severity::Warning, "Connection closed");
                    break;
                }
                Some(Ok(_)) => {} // binary/ping/pong frames carry no state
                Some(Err(e)) => {
                    warn!(error = %e, "Websocket error");
                    inner.set_state(ConnectionState::Error(e.to_string()));
                    inner.notify(Severity::Error, format!("Error: {e}"));
                    break;
                }
            },
            outgoing = outbound_rx.recv() => {
                if let Some(json) = outgoing {
                    if write.send(Message::text(json)).await.is_err() {
                        debug!("Send failed, tearing down session");
                        break;
                    }
                } else {
                    break;
                }
            }
            () = shutdown.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
        }
    }
}
