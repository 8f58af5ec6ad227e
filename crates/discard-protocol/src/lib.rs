//! # discard-protocol
//!
//! Wire protocol definitions for the Discard realtime event stream.
//!
//! Every frame is one UTF-8 JSON object carried in one WebSocket text
//! message, discriminated by its `type` field. There is no batching.
//!
//! ## Frame Types
//!
//! - Outbound: `presence_request`, `subscribe`, `unsubscribe`, `message`
//! - Inbound: `message`, `message_edit`, `message_delete`,
//!   `presence_update`, `presence_list`, `server_update`, `server_delete`
//!
//! Decoding is total: anything the client does not understand becomes
//! [`InboundFrame::Unrecognized`] instead of an error.
//!
//! ## Example
//!
//! ```rust
//! use discard_protocol::{codec, InboundFrame, OutboundFrame};
//!
//! let wire = codec::encode(&OutboundFrame::subscribe("general")).unwrap();
//! assert_eq!(wire, r#"{"type":"subscribe","channel_id":"general"}"#);
//!
//! let frame = codec::decode(r#"{"type":"presence_list","user_ids":["a"]}"#);
//! assert!(matches!(frame, InboundFrame::PresenceList { .. }));
//!
//! let junk = codec::decode("not json");
//! assert_eq!(junk, InboundFrame::Unrecognized);
//! ```

pub mod codec;
pub mod frames;
pub mod models;

pub use codec::{decode, encode, try_decode, ProtocolError};
pub use frames::{FrameKind, InboundFrame, OutboundFrame, PresenceStatus};
pub use models::{Attachment, ChannelId, ChatMessage, MessageId, Server, ServerId, UserId};
