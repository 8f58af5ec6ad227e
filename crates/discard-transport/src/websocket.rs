//! WebSocket transport implementation.
//!
//! This module provides the client-side WebSocket connection using
//! tokio-tungstenite. Each connection owns one background task that performs
//! the handshake and then shuttles frames between the socket and the
//! connection handle.

use async_trait::async_trait;
use discard_protocol::{codec, OutboundFrame};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, trace, warn};

use crate::endpoint::Endpoint;
use crate::traits::{
    transition, Connection, ConnectionId, ConnectionState, Connector, TransportError,
};

/// WebSocket transport configuration.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Event stream endpoint.
    pub endpoint: Endpoint,
    /// Maximum inbound text frame size in bytes; larger frames are dropped.
    pub max_message_size: usize,
    /// Inbound frames buffered before the socket stops being read.
    pub inbound_capacity: usize,
}

impl WebSocketConfig {
    /// Create a config for an endpoint with default limits.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            max_message_size: 1024 * 1024, // 1 MB
            inbound_capacity: 256,
        }
    }
}

/// Opens WebSocket connections to one endpoint.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    config: WebSocketConfig,
}

impl WebSocketConnector {
    /// Create a new connector.
    #[must_use]
    pub fn new(config: WebSocketConfig) -> Self {
        Self { config }
    }

    /// Create a connector for the app served at `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin cannot be mapped to an endpoint.
    pub fn from_origin(origin: &str) -> Result<Self, TransportError> {
        Ok(Self::new(WebSocketConfig::new(Endpoint::from_origin(
            origin,
        )?)))
    }

    /// Get the endpoint this connector targets.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.config.endpoint
    }

    /// Start a new connection.
    ///
    /// Returns immediately in `Connecting`. Must be called within a tokio runtime.
    #[must_use]
    pub fn connect(&self) -> WebSocketConnection {
        let id = ConnectionId::generate();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::channel(self.config.inbound_capacity.max(1));

        debug!(connection = %id, endpoint = %self.config.endpoint, "Opening WebSocket");

        tokio::spawn(run_connection(
            id.clone(),
            self.config.clone(),
            state_tx,
            command_rx,
            inbound_tx,
        ));

        WebSocketConnection {
            id,
            state: state_rx,
            commands: command_tx,
            inbound: inbound_rx,
        }
    }
}

impl Connector for WebSocketConnector {
    fn open(&self) -> Box<dyn Connection> {
        Box::new(self.connect())
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}

/// Instructions from the handle to the connection task.
enum Command {
    Send(String),
    Close,
}

/// A WebSocket connection handle.
///
/// Dropping the handle closes the connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    state: watch::Receiver<ConnectionState>,
    commands: mpsc::UnboundedSender<Command>,
    inbound: mpsc::Receiver<String>,
}

#[async_trait]
impl Connection for WebSocketConnection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    fn send(&self, frame: &OutboundFrame) -> Result<(), TransportError> {
        if self.state() != ConnectionState::Open {
            trace!(connection = %self.id, frame = frame.type_name(), "Dropping frame, not open");
            return Err(TransportError::NotOpen);
        }

        let text = codec::encode(frame)?;
        self.commands
            .send(Command::Send(text))
            .map_err(|_| TransportError::NotOpen)
    }

    async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }
}

/// Wait until the handle asks to close or goes away, discarding sends.
async fn close_requested(commands: &mut mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = commands.recv().await {
        if let Command::Close = command {
            return;
        }
    }
}

/// Drive one connection from handshake to close.
async fn run_connection(
    id: ConnectionId,
    config: WebSocketConfig,
    state: watch::Sender<ConnectionState>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    inbound: mpsc::Sender<String>,
) {
    let stream = tokio::select! {
        result = connect_async(config.endpoint.as_str()) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                warn!(connection = %id, endpoint = %config.endpoint, "WebSocket handshake failed: {}", e);
                transition(&state, ConnectionState::Closed);
                return;
            }
        },
        () = close_requested(&mut commands) => {
            debug!(connection = %id, "Closed while connecting");
            transition(&state, ConnectionState::Closed);
            return;
        }
    };

    let (mut sink, mut source) = stream.split();

    // The server answers this with the full presence list.
    match codec::encode(&OutboundFrame::presence_request()) {
        Ok(text) => {
            if let Err(e) = sink.send(Message::Text(text)).await {
                warn!(connection = %id, "Failed to send presence request: {}", e);
                transition(&state, ConnectionState::Closed);
                return;
            }
        }
        Err(e) => warn!(connection = %id, "Failed to encode presence request: {}", e),
    }

    transition(&state, ConnectionState::Open);
    debug!(connection = %id, "WebSocket open");

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!(connection = %id, "Send failed: {}", e);
                        break;
                    }
                }
                Some(Command::Close) | None => {
                    if let Err(e) = sink.close().await {
                        debug!(connection = %id, "Close handshake failed: {}", e);
                    }
                    break;
                }
            },
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if text.len() > config.max_message_size {
                        warn!(
                            connection = %id,
                            "Message too large: {} bytes (max: {})",
                            text.len(),
                            config.max_message_size
                        );
                        continue;
                    }
                    trace!(connection = %id, bytes = text.len(), "Received frame");
                    if inbound.send(text).await.is_err() {
                        // Handle dropped; nobody is listening.
                        break;
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    trace!(connection = %id, bytes = data.len(), "Ignoring binary frame");
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = sink.send(Message::Pong(data)).await {
                        warn!(connection = %id, "Failed to send pong: {}", e);
                    }
                }
                Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                Some(Ok(Message::Close(_))) => {
                    debug!(connection = %id, "Received close frame");
                    break;
                }
                Some(Err(e)) => {
                    warn!(connection = %id, "WebSocket error: {}", e);
                    break;
                }
                None => {
                    debug!(connection = %id, "WebSocket stream ended");
                    break;
                }
            }
        }
    }

    transition(&state, ConnectionState::Closed);
    debug!(connection = %id, "WebSocket closed");
}
