//! In-memory connection pair.
//!
//! [`MemoryConnection`] behaves like a WebSocket connection from the client's
//! side; [`MemoryPeer`] plays the server. The peer drives the lifecycle:
//! nothing is delivered and nothing can be sent until it calls
//! [`MemoryPeer::open`], which also issues the automatic presence request
//! the way a real connection does on open.

use async_trait::async_trait;
use discard_protocol::{codec, InboundFrame, OutboundFrame};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

use crate::traits::{transition, Connection, ConnectionId, ConnectionState, TransportError};

/// Client side of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    state: Arc<watch::Sender<ConnectionState>>,
    state_rx: watch::Receiver<ConnectionState>,
    outbound: mpsc::UnboundedSender<OutboundFrame>,
    inbound: mpsc::UnboundedReceiver<String>,
}

/// Server side of an in-memory connection.
pub struct MemoryPeer {
    id: ConnectionId,
    state: Arc<watch::Sender<ConnectionState>>,
    outbound_tx: mpsc::UnboundedSender<OutboundFrame>,
    outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    inbound: mpsc::UnboundedSender<String>,
}

impl MemoryConnection {
    /// Create a connected pair. Both sides start in `Connecting`.
    #[must_use]
    pub fn pair() -> (MemoryConnection, MemoryPeer) {
        let id = ConnectionId::generate();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let state = Arc::new(state_tx);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let conn = MemoryConnection {
            id: id.clone(),
            state: Arc::clone(&state),
            state_rx,
            outbound: outbound_tx.clone(),
            inbound: inbound_rx,
        };
        let peer = MemoryPeer {
            id,
            state,
            outbound_tx,
            outbound: outbound_rx,
            inbound: inbound_tx,
        };
        (conn, peer)
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    fn send(&self, frame: &OutboundFrame) -> Result<(), TransportError> {
        if self.state() != ConnectionState::Open {
            trace!(connection = %self.id, frame = frame.type_name(), "Dropping frame, not open");
            return Err(TransportError::NotOpen);
        }

        // Same size limit as the wire.
        codec::encode(frame)?;

        self.outbound
            .send(frame.clone())
            .map_err(|_| TransportError::NotOpen)
    }

    async fn recv(&mut self) -> Option<String> {
        tokio::select! {
            biased;
            text = self.inbound.recv() => text,
            () = closed(self.state_rx.clone()) => None,
        }
    }

    fn close(&self) {
        if transition(&self.state, ConnectionState::Closed) {
            debug!(connection = %self.id, "Memory connection closed by client");
        }
    }
}

/// Resolves once the state reaches `Closed`.
async fn closed(mut state: watch::Receiver<ConnectionState>) {
    let _ = state.wait_for(|s| *s == ConnectionState::Closed).await;
}

impl MemoryPeer {
    /// Get the connection ID shared with the client side.
    #[must_use]
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Complete the handshake: move to `Open` and send the presence request.
    pub fn open(&self) {
        if transition(&self.state, ConnectionState::Open) {
            let _ = self.outbound_tx.send(OutboundFrame::presence_request());
            debug!(connection = %self.id, "Memory connection open");
        }
    }

    /// Close the connection from the server side.
    pub fn close(&self) {
        if transition(&self.state, ConnectionState::Closed) {
            debug!(connection = %self.id, "Memory connection closed by peer");
        }
    }

    /// Deliver a raw text frame to the client.
    ///
    /// Returns `false` if the connection is not open.
    pub fn push_text(&self, text: impl Into<String>) -> bool {
        self.state() == ConnectionState::Open && self.inbound.send(text.into()).is_ok()
    }

    /// Deliver an inbound frame to the client.
    ///
    /// Returns `false` if the connection is not open or the frame cannot be encoded.
    pub fn push(&self, frame: &InboundFrame) -> bool {
        match serde_json::to_string(frame) {
            Ok(text) => self.push_text(text),
            Err(_) => false,
        }
    }

    /// Take the next frame the client sent, if any.
    pub fn try_next_outbound(&mut self) -> Option<OutboundFrame> {
        self.outbound.try_recv().ok()
    }

    /// Take every frame the client has sent so far.
    pub fn drain_outbound(&mut self) -> Vec<OutboundFrame> {
        std::iter::from_fn(|| self.outbound.try_recv().ok()).collect()
    }
}
