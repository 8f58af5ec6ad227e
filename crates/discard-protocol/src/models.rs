//! Chat entities carried inside inbound frames.
//!
//! Only the fields the client needs to route a frame are required. Everything
//! else defaults, so that older or newer servers still produce usable frames.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// A user identifier.
pub type UserId = String;

/// A channel identifier.
pub type ChannelId = String;

/// A message identifier.
pub type MessageId = String;

/// A server (guild) identifier.
pub type ServerId = String;

/// Deserialize a string that must not be empty.
///
/// Routing keys sent as `""` count as absent, so the frame carrying them
/// fails to decode and is dropped.
pub(crate) fn non_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        return Err(de::Error::invalid_value(
            de::Unexpected::Str(""),
            &"a non-empty string",
        ));
    }
    Ok(T::from(value))
}

/// A chat message as pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message identifier.
    #[serde(default)]
    pub id: MessageId,
    /// Channel the message belongs to.
    #[serde(deserialize_with = "non_empty")]
    pub channel_id: ChannelId,
    /// Author's user identifier.
    #[serde(default)]
    pub author_id: UserId,
    /// Raw (unrendered) message body.
    #[serde(default)]
    pub content: String,
    /// Whether the message was edited after posting.
    #[serde(default)]
    pub edited: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Author's username, when the server joined it in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
    /// File attachments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl ChatMessage {
    /// Create a message with only the routing fields set.
    #[must_use]
    pub fn new(channel_id: impl Into<ChannelId>, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            channel_id: channel_id.into(),
            author_id: UserId::new(),
            content: content.into(),
            edited: false,
            created_at: None,
            updated_at: None,
            author_username: None,
            attachments: Vec::new(),
        }
    }

    /// Set the message identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<MessageId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the author.
    #[must_use]
    pub fn with_author(mut self, author_id: impl Into<UserId>) -> Self {
        self.author_id = author_id.into();
        self
    }

    /// Name to show for the author: the username if known, else the id.
    #[must_use]
    pub fn author_label(&self) -> &str {
        self.author_username.as_deref().unwrap_or(&self.author_id)
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub id: String,
    pub message_id: MessageId,
    /// Server-relative path of the stored file.
    pub file_path: String,
    /// File name as uploaded.
    pub original_name: String,
    pub mime_type: Option<String>,
    /// Size in bytes.
    pub file_size: Option<i64>,
    /// Pixel width, for images.
    pub width: Option<u32>,
    /// Pixel height, for images.
    pub height: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A server (guild) as pushed in `server_update` frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Server identifier.
    pub id: ServerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon_path: Option<String>,
    /// Owner's user identifier.
    #[serde(default)]
    pub owner_id: UserId,
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Server {
    /// Create a server with only the identifier and name set.
    #[must_use]
    pub fn new(id: impl Into<ServerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon_path: None,
            owner_id: UserId::new(),
            invite_code: None,
            created_at: None,
        }
    }
}
