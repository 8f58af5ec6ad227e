//! # discard-transport
//!
//! Duplex connection layer for the Discard realtime client.
//!
//! A [`Connection`] is one live link to the server's event endpoint. It moves
//! through [`ConnectionState::Connecting`], [`ConnectionState::Open`] and
//! [`ConnectionState::Closed`], never backwards, and never reconnects on its
//! own. Sending is fire-and-forget: a frame offered while the connection is
//! not open is dropped and reported as [`TransportError::NotOpen`].
//!
//! Implementations:
//!
//! - **WebSocket** - the real thing, over `tokio-tungstenite`
//! - **Memory** - an in-process pair for tests and benchmarks
//!
//! ```rust,ignore
//! use discard_transport::{Connection, WebSocketConnector};
//!
//! let connector = WebSocketConnector::from_origin("https://chat.example.com")?;
//! let mut conn = connector.connect();
//! while let Some(text) = conn.recv().await {
//!     // Dispatch frame
//! }
//! ```

pub mod endpoint;
pub mod memory;
pub mod traits;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use endpoint::{Endpoint, WEBSOCKET_PATH};
pub use memory::{MemoryConnection, MemoryPeer};
pub use traits::{Connection, ConnectionId, ConnectionState, Connector, TransportError};

#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConfig, WebSocketConnection, WebSocketConnector};
