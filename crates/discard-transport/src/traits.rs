//! Connection abstraction for the Discard client.
//!
//! These traits define what the event session needs from a duplex link,
//! so that the session does not care whether frames travel over a real
//! WebSocket or an in-memory pair.

use async_trait::async_trait;
use discard_protocol::OutboundFrame;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::watch;

/// Counter backing [`ConnectionId::generate`].
static CONNECTION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a connection, used in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Create a new connection ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a process-unique connection ID.
    #[must_use]
    pub fn generate() -> Self {
        let n = CONNECTION_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("conn_{:x}", n))
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle of a connection.
///
/// Transitions only go forward: `Connecting -> Open -> Closed`, or
/// `Connecting -> Closed` when the handshake fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        matches!(
            (self, next),
            (ConnectionState::Connecting, ConnectionState::Open)
                | (ConnectionState::Connecting, ConnectionState::Closed)
                | (ConnectionState::Open, ConnectionState::Closed)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Apply a state transition if it is legal. Returns `true` if the state changed.
pub(crate) fn transition(state: &watch::Sender<ConnectionState>, next: ConnectionState) -> bool {
    state.send_if_modified(|current| {
        if current.can_transition_to(next) {
            *current = next;
            true
        } else {
            false
        }
    })
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection is still connecting or already closed; the frame was dropped.
    #[error("Connection is not open")]
    NotOpen,

    /// The page origin cannot be turned into an event endpoint.
    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    /// Protocol error.
    #[error("Protocol error: {0}")]
    Protocol(#[from] discard_protocol::ProtocolError),
}

/// Something that can open connections to the event endpoint.
///
/// Opening never fails up front: a connection that cannot be established
/// shows up as a `Connecting -> Closed` transition.
pub trait Connector: Send + Sync {
    /// Start opening a new connection. Requires a tokio runtime.
    fn open(&self) -> Box<dyn Connection>;

    /// Get the transport name (e.g., "websocket", "memory").
    fn name(&self) -> &'static str;
}

/// An open (or opening) duplex link to the server.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the connection's unique identifier.
    fn id(&self) -> &ConnectionId;

    /// Current lifecycle state.
    fn state(&self) -> ConnectionState;

    /// A receiver that observes every state transition.
    fn watch_state(&self) -> watch::Receiver<ConnectionState>;

    /// Queue a frame for sending.
    ///
    /// Never blocks. Fails with [`TransportError::NotOpen`] unless the
    /// connection is open; the frame is dropped in that case.
    fn send(&self, frame: &OutboundFrame) -> Result<(), TransportError>;

    /// Receive the next inbound text frame.
    ///
    /// Returns `None` once the connection is closed and every frame that
    /// arrived before the close has been handed out.
    async fn recv(&mut self) -> Option<String>;

    /// Close the connection. Idempotent.
    fn close(&self);

    /// Check if the connection is open.
    fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_generation() {
        let id1 = ConnectionId::generate();
        let id2 = ConnectionId::generate();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("conn_"));
    }

    #[test]
    fn test_state_transitions() {
        use ConnectionState::*;

        assert!(Connecting.can_transition_to(Open));
        assert!(Connecting.can_transition_to(Closed));
        assert!(Open.can_transition_to(Closed));

        assert!(!Open.can_transition_to(Connecting));
        assert!(!Closed.can_transition_to(Open));
        assert!(!Closed.can_transition_to(Closed));
    }

    #[test]
    fn test_transition_ignores_illegal_moves() {
        let (tx, rx) = watch::channel(ConnectionState::Connecting);

        assert!(transition(&tx, ConnectionState::Closed));
        assert!(!transition(&tx, ConnectionState::Open));
        assert_eq!(*rx.borrow(), ConnectionState::Closed);
    }
}
