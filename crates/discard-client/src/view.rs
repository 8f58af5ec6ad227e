//! Caller-owned view state: the active channel and unread counters.

use dashmap::DashMap;
use discard_protocol::ChannelId;
use parking_lot::RwLock;
use std::sync::Arc;

/// What the user is looking at, shared with observer callbacks.
///
/// Survives reconnects; only the session is rebuilt.
#[derive(Debug, Clone, Default)]
pub struct ChatView {
    active: Arc<RwLock<Option<ChannelId>>>,
    unread: Arc<DashMap<ChannelId, u64>>,
}

impl ChatView {
    /// Create a view with no active channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the active channel.
    #[must_use]
    pub fn active(&self) -> Option<ChannelId> {
        self.active.read().clone()
    }

    /// Switch to a channel, clearing its unread counter.
    pub fn set_active(&self, channel_id: &str) {
        *self.active.write() = Some(channel_id.to_string());
        self.unread.remove(channel_id);
    }

    /// Forget a channel. If it was active, `fallback` becomes active.
    pub fn leave(&self, channel_id: &str, fallback: Option<&str>) {
        self.unread.remove(channel_id);
        let was_active = self.active.read().as_deref() == Some(channel_id);
        if was_active {
            match fallback {
                Some(next) => self.set_active(next),
                None => *self.active.write() = None,
            }
        }
    }

    /// Count a new message, unless its channel is the active one.
    pub fn mark_unread(&self, channel_id: &str) {
        if self.active.read().as_deref() == Some(channel_id) {
            return;
        }
        *self.unread.entry(channel_id.to_string()).or_insert(0) += 1;
    }

    /// Unread counters, sorted by channel.
    #[must_use]
    pub fn unread_counts(&self) -> Vec<(ChannelId, u64)> {
        let mut counts: Vec<(ChannelId, u64)> = self
            .unread
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        counts.sort();
        counts
    }
}
