//! WebSocket connection management.
//!
//! A single [`ConnectionManager`] task owns the socket for the lifetime of the
//! client:
//!
//! ```text
//!   ConnectionHandle ──(ClientFrame)──▶ ConnectionManager ──▶ Socket
//!          ▲                                  │
//!          │ watch<ConnectionState>           │ parse_frame
//!          └──────────────────────────────────┤
//!                                             ▼
//!                                        EventSender ──▶ UI loop
//! ```
//!
//! The manager is the only place that schedules reconnects. Because the retry
//! sleep lives inside its loop there is never more than one pending reconnect.

mod policy;
mod transport;

pub use policy::{ReconnectPolicy, DEFAULT_RECONNECT_DELAY_MS};
pub use transport::{Connector, Socket, WsConnector};

use crate::messaging::EventSender;
use crate::protocol::{self, ClientFrame};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Default backend endpoint.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws/chat";

/// Connection errors. None of these reach the user; they are logged and the
/// manager reconnects.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Connection closed")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Whether the client can currently send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    Connected,
    #[default]
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

/// Cheap, cloneable handle used by the UI to send frames and observe state.
#[derive(Clone)]
pub struct ConnectionHandle {
    outbound: mpsc::UnboundedSender<ClientFrame>,
    state: watch::Receiver<ConnectionState>,
}

impl ConnectionHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Queue a frame for the socket.
    ///
    /// While disconnected this does nothing and returns `false`. Frames are
    /// never buffered across a reconnect.
    pub fn send(&self, frame: ClientFrame) -> bool {
        if !self.is_connected() {
            tracing::debug!("Send ignored while disconnected");
            return false;
        }
        self.outbound.send(frame).is_ok()
    }
}

/// Manager-side ends of a [`ConnectionHandle`].
pub struct ConnectionLink {
    outbound: mpsc::UnboundedReceiver<ClientFrame>,
    state: watch::Sender<ConnectionState>,
}

impl ConnectionLink {
    /// Publish a state change. Returns `true` when the state actually changed.
    pub fn set_state(&self, next: ConnectionState) -> bool {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    /// Next frame queued by a handle, if any, without waiting.
    pub fn try_next_frame(&mut self) -> Option<ClientFrame> {
        self.outbound.try_recv().ok()
    }
}

/// Create a connected handle/link pair. The link goes to a
/// [`ConnectionManager`]; the handle goes to the UI.
pub fn channel() -> (ConnectionHandle, ConnectionLink) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
    (
        ConnectionHandle {
            outbound: outbound_tx,
            state: state_rx,
        },
        ConnectionLink {
            outbound: outbound_rx,
            state: state_tx,
        },
    )
}

/// Owns the socket, reconnects on loss and forwards parsed frames.
pub struct ConnectionManager<C> {
    url: String,
    policy: ReconnectPolicy,
    connector: C,
    events: EventSender,
}

impl<C: Connector + 'static> ConnectionManager<C> {
    pub fn new(
        url: impl Into<String>,
        policy: ReconnectPolicy,
        connector: C,
        events: EventSender,
    ) -> Self {
        Self {
            url: url.into(),
            policy,
            connector,
            events,
        }
    }

    /// Spawn the manager loop on the current runtime.
    pub fn spawn(self, link: ConnectionLink, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(link, shutdown))
    }

    /// Connect, pump frames, and reconnect until shutdown.
    pub async fn run(self, mut link: ConnectionLink, mut shutdown: watch::Receiver<bool>) {
        let mut attempt: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tracing::debug!(url = %self.url, "Connecting");
            let connected = tokio::select! {
                result = self.connector.connect(&self.url) => result,
                _ = shutdown.changed() => break,
            };

            match connected {
                Ok(mut socket) => {
                    attempt = 0;
                    self.publish_state(&link, ConnectionState::Connected);
                    tracing::info!(url = %self.url, "WebSocket connected");

                    let stop = self
                        .pump(socket.as_mut(), &mut link.outbound, &mut shutdown)
                        .await;
                    self.publish_state(&link, ConnectionState::Disconnected);
                    if stop {
                        break;
                    }
                    tracing::info!("WebSocket disconnected");
                }
                Err(e) => {
                    tracing::warn!(url = %self.url, error = %e, "Connection attempt failed");
                    self.publish_state(&link, ConnectionState::Disconnected);
                }
            }

            // Anything queued now raced the disconnect; it is not replayed.
            while let Some(frame) = link.try_next_frame() {
                tracing::warn!(
                    chars = frame.message.len(),
                    "Dropping frame queued during disconnect"
                );
            }

            attempt = attempt.saturating_add(1);
            let delay = self.policy.delay_for(attempt);
            tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Reconnect scheduled");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.publish_state(&link, ConnectionState::Disconnected);
        tracing::debug!("Connection manager stopped");
    }

    /// Shuttle frames until the socket closes. Returns `true` on shutdown.
    async fn pump(
        &self,
        socket: &mut dyn Socket,
        outbound: &mut mpsc::UnboundedReceiver<ClientFrame>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        loop {
            tokio::select! {
                inbound = socket.next_text() => match inbound {
                    Some(Ok(text)) => self.dispatch(&text),
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "WebSocket read failed");
                        return false;
                    }
                    None => return false,
                },
                frame = outbound.recv() => match frame {
                    Some(frame) => match frame.to_json() {
                        Ok(json) => {
                            if let Err(e) = socket.send_text(json).await {
                                tracing::warn!(error = %e, "WebSocket write failed");
                                return false;
                            }
                        }
                        Err(e) => tracing::error!(error = %e, "Could not encode outbound frame"),
                    },
                    // Every handle is gone; nobody can send or observe anymore.
                    None => return true,
                },
                _ = shutdown.changed() => return true,
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match protocol::parse_frame(text) {
            Ok(Some(frame)) => {
                tracing::trace!(frame_type = frame.kind(), "Frame received");
                self.events.frame(frame);
            }
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Dropping malformed frame"),
        }
    }

    fn publish_state(&self, link: &ConnectionLink, state: ConnectionState) {
        if link.set_state(state) {
            self.events.connection(state);
        }
    }
}
