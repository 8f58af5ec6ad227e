//! Channel subscriptions.
//!
//! Subscribing is a fire-and-forget control frame: the server decides what
//! is actually delivered and never acknowledges. A frame offered to a
//! connection that is not open is dropped without error.
//!
//! The free functions are all the core needs. [`SubscriptionSet`] is an
//! optional helper for callers that want to remember their subscriptions and
//! replay them after reconnecting; the dispatcher never looks at it.

use dashmap::DashSet;
use discard_protocol::{ChannelId, OutboundFrame};
use discard_transport::Connection;
use std::sync::Arc;
use tracing::debug;

/// Hand a frame to the connection. Returns `true` if it was accepted.
fn send_frame<C: Connection + ?Sized>(conn: &C, frame: OutboundFrame) -> bool {
    conn.send(&frame).is_ok()
}

/// Ask for live delivery on a channel.
///
/// Returns `false` if the frame was dropped because the connection is not open.
pub fn subscribe<C: Connection + ?Sized>(conn: &C, channel_id: &str) -> bool {
    let sent = send_frame(conn, OutboundFrame::subscribe(channel_id));
    if sent {
        debug!(connection = %conn.id(), channel = %channel_id, "Subscribed");
    }
    sent
}

/// Stop live delivery on a channel.
///
/// Returns `false` if the frame was dropped because the connection is not open.
pub fn unsubscribe<C: Connection + ?Sized>(conn: &C, channel_id: &str) -> bool {
    let sent = send_frame(conn, OutboundFrame::unsubscribe(channel_id));
    if sent {
        debug!(connection = %conn.id(), channel = %channel_id, "Unsubscribed");
    }
    sent
}

/// Post a message to a channel.
///
/// Blank content is not sent, and neither is a message too large for the
/// server to accept. Returns `false` in those cases and when the connection
/// is not open.
pub fn send_message<C: Connection + ?Sized>(conn: &C, channel_id: &str, content: &str) -> bool {
    if content.trim().is_empty() {
        return false;
    }
    send_frame(conn, OutboundFrame::message(channel_id, content))
}

/// Caller-owned record of the channels it wants live updates for.
///
/// Cloning yields another handle to the same set.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionSet {
    channels: Arc<DashSet<ChannelId>>,
}

impl SubscriptionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a channel. Returns `true` if it was not already present.
    pub fn insert(&self, channel_id: impl Into<ChannelId>) -> bool {
        self.channels.insert(channel_id.into())
    }

    /// Forget a channel. Returns `true` if it was present.
    pub fn remove(&self, channel_id: &str) -> bool {
        self.channels.remove(channel_id).is_some()
    }

    /// Check if a channel is recorded.
    #[must_use]
    pub fn contains(&self, channel_id: &str) -> bool {
        self.channels.contains(channel_id)
    }

    /// Get the number of recorded channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if no channels are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Get all recorded channel ids, sorted.
    #[must_use]
    pub fn channels(&self) -> Vec<ChannelId> {
        let mut channels: Vec<ChannelId> = self.channels.iter().map(|c| c.clone()).collect();
        channels.sort();
        channels
    }

    /// Iterate over the recorded channel ids, sorted.
    pub fn iter(&self) -> impl Iterator<Item = ChannelId> {
        self.channels().into_iter()
    }

    /// Record a channel and send the subscribe frame.
    ///
    /// The channel stays recorded even if the frame is dropped, so that a
    /// later [`replay`](Self::replay) picks it up.
    pub fn subscribe<C: Connection + ?Sized>(&self, conn: &C, channel_id: &str) -> bool {
        self.insert(channel_id);
        subscribe(conn, channel_id)
    }

    /// Forget a channel and send the unsubscribe frame.
    pub fn unsubscribe<C: Connection + ?Sized>(&self, conn: &C, channel_id: &str) -> bool {
        self.remove(channel_id);
        unsubscribe(conn, channel_id)
    }

    /// Send a subscribe frame for every recorded channel, e.g. after
    /// reconnecting. Returns how many frames were accepted.
    pub fn replay<C: Connection + ?Sized>(&self, conn: &C) -> usize {
        let sent = self
            .channels()
            .iter()
            .filter(|channel_id| subscribe(conn, channel_id))
            .count();
        debug!(connection = %conn.id(), channels = sent, "Replayed subscriptions");
        sent
    }
}
