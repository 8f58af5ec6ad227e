//! Frame types for the Discard realtime protocol.
//!
//! Frames are JSON objects discriminated by a `type` field. The client sends
//! [`OutboundFrame`]s and receives [`InboundFrame`]s; the two directions share
//! the `message` discriminator but not its shape.

use serde::{Deserialize, Serialize};

use crate::models::{non_empty, ChannelId, ChatMessage, MessageId, Server, ServerId, UserId};

/// Kinds of inbound frame the client routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Message,
    MessageEdit,
    MessageDelete,
    PresenceUpdate,
    PresenceList,
    ServerUpdate,
    ServerDelete,
}

impl FrameKind {
    /// All routable kinds, in routing-table order.
    pub const ALL: [FrameKind; 7] = [
        FrameKind::PresenceList,
        FrameKind::PresenceUpdate,
        FrameKind::ServerUpdate,
        FrameKind::ServerDelete,
        FrameKind::Message,
        FrameKind::MessageEdit,
        FrameKind::MessageDelete,
    ];

    /// The `type` discriminator used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FrameKind::Message => "message",
            FrameKind::MessageEdit => "message_edit",
            FrameKind::MessageDelete => "message_delete",
            FrameKind::PresenceUpdate => "presence_update",
            FrameKind::PresenceList => "presence_list",
            FrameKind::ServerUpdate => "server_update",
            FrameKind::ServerDelete => "server_delete",
        }
    }

    /// Look up a kind by its wire discriminator.
    #[must_use]
    pub fn from_type(discriminator: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == discriminator)
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's presence status.
///
/// Only `"online"` counts as online; every other value is treated as offline
/// but is kept verbatim so it re-encodes to what the server sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PresenceStatus {
    Online,
    Offline,
    Other(String),
}

impl PresenceStatus {
    /// Whether this status marks the user as online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        matches!(self, PresenceStatus::Online)
    }
}

impl From<String> for PresenceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "online" => PresenceStatus::Online,
            "offline" => PresenceStatus::Offline,
            _ => PresenceStatus::Other(value),
        }
    }
}

impl From<PresenceStatus> for String {
    fn from(status: PresenceStatus) -> String {
        match status {
            PresenceStatus::Online => "online".to_string(),
            PresenceStatus::Offline => "offline".to_string(),
            PresenceStatus::Other(value) => value,
        }
    }
}

/// A frame sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Ask the server for the full online set; answered by `presence_list`.
    PresenceRequest,

    /// Start live delivery for a channel.
    Subscribe {
        channel_id: ChannelId,
    },

    /// Stop live delivery for a channel.
    Unsubscribe {
        channel_id: ChannelId,
    },

    /// Post a chat message.
    Message {
        channel_id: ChannelId,
        content: String,
    },
}

impl OutboundFrame {
    /// Create a new PresenceRequest frame.
    #[must_use]
    pub fn presence_request() -> Self {
        OutboundFrame::PresenceRequest
    }

    /// Create a new Subscribe frame.
    #[must_use]
    pub fn subscribe(channel_id: impl Into<ChannelId>) -> Self {
        OutboundFrame::Subscribe {
            channel_id: channel_id.into(),
        }
    }

    /// Create a new Unsubscribe frame.
    #[must_use]
    pub fn unsubscribe(channel_id: impl Into<ChannelId>) -> Self {
        OutboundFrame::Unsubscribe {
            channel_id: channel_id.into(),
        }
    }

    /// Create a new Message frame.
    #[must_use]
    pub fn message(channel_id: impl Into<ChannelId>, content: impl Into<String>) -> Self {
        OutboundFrame::Message {
            channel_id: channel_id.into(),
            content: content.into(),
        }
    }

    /// The `type` discriminator of this frame.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundFrame::PresenceRequest => "presence_request",
            OutboundFrame::Subscribe { .. } => "subscribe",
            OutboundFrame::Unsubscribe { .. } => "unsubscribe",
            OutboundFrame::Message { .. } => "message",
        }
    }
}

/// A frame received from the server.
///
/// Decoding never fails: see [`crate::codec::decode`], which maps malformed
/// or unknown input to [`InboundFrame::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// A new message in a subscribed channel.
    Message { message: ChatMessage },

    /// An existing message was edited.
    MessageEdit { message: ChatMessage },

    /// A message was deleted.
    MessageDelete {
        #[serde(deserialize_with = "non_empty")]
        channel_id: ChannelId,
        #[serde(deserialize_with = "non_empty")]
        message_id: MessageId,
    },

    /// A single user's presence changed.
    PresenceUpdate {
        #[serde(deserialize_with = "non_empty")]
        user_id: UserId,
        #[serde(deserialize_with = "non_empty")]
        status: PresenceStatus,
    },

    /// The full set of online users.
    PresenceList { user_ids: Vec<UserId> },

    /// A server was created or changed.
    ServerUpdate { server: Server },

    /// A server was deleted.
    ServerDelete {
        #[serde(deserialize_with = "non_empty")]
        server_id: ServerId,
    },

    /// Anything the client does not understand. Never produced by serde.
    #[serde(skip)]
    Unrecognized,
}

impl InboundFrame {
    /// Get the frame kind, or `None` for [`InboundFrame::Unrecognized`].
    #[must_use]
    pub fn kind(&self) -> Option<FrameKind> {
        match self {
            InboundFrame::Message { .. } => Some(FrameKind::Message),
            InboundFrame::MessageEdit { .. } => Some(FrameKind::MessageEdit),
            InboundFrame::MessageDelete { .. } => Some(FrameKind::MessageDelete),
            InboundFrame::PresenceUpdate { .. } => Some(FrameKind::PresenceUpdate),
            InboundFrame::PresenceList { .. } => Some(FrameKind::PresenceList),
            InboundFrame::ServerUpdate { .. } => Some(FrameKind::ServerUpdate),
            InboundFrame::ServerDelete { .. } => Some(FrameKind::ServerDelete),
            InboundFrame::Unrecognized => None,
        }
    }

    /// Create a new Message frame.
    #[must_use]
    pub fn message(message: ChatMessage) -> Self {
        InboundFrame::Message { message }
    }

    /// Create a new MessageEdit frame.
    #[must_use]
    pub fn message_edit(message: ChatMessage) -> Self {
        InboundFrame::MessageEdit { message }
    }

    /// Create a new MessageDelete frame.
    #[must_use]
    pub fn message_delete(channel_id: impl Into<ChannelId>, message_id: impl Into<MessageId>) -> Self {
        InboundFrame::MessageDelete {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }

    /// Create a new PresenceUpdate frame.
    #[must_use]
    pub fn presence_update(user_id: impl Into<UserId>, status: PresenceStatus) -> Self {
        InboundFrame::PresenceUpdate {
            user_id: user_id.into(),
            status,
        }
    }

    /// Create a new PresenceList frame.
    #[must_use]
    pub fn presence_list<I, S>(user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<UserId>,
    {
        InboundFrame::PresenceList {
            user_ids: user_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a new ServerUpdate frame.
    #[must_use]
    pub fn server_update(server: Server) -> Self {
        InboundFrame::ServerUpdate { server }
    }

    /// Create a new ServerDelete frame.
    #[must_use]
    pub fn server_delete(server_id: impl Into<ServerId>) -> Self {
        InboundFrame::ServerDelete {
            server_id: server_id.into(),
        }
    }
}
