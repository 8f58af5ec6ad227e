//! Presence tracking.
//!
//! The server pushes presence in two forms: a full list of online users
//! (sent in reply to the presence request issued on connect) and single-user
//! deltas. The reconciler folds both into one set of online user ids.
//!
//! Only [`PresenceReconciler`] can mutate the set, and only the dispatcher
//! owns a reconciler. Everyone else gets a read-only [`PresenceView`].

use discard_protocol::{PresenceStatus, UserId};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::trace;

/// Whether the server has sent a full presence list yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresencePhase {
    /// No `presence_list` received on this session yet.
    Empty,
    /// At least one `presence_list` has been applied.
    Populated,
}

#[derive(Debug)]
struct PresenceState {
    phase: PresencePhase,
    online: HashSet<UserId>,
}

/// Write side of the presence set.
#[derive(Debug)]
pub struct PresenceReconciler {
    state: Arc<RwLock<PresenceState>>,
}

impl PresenceReconciler {
    /// Create a reconciler with an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(PresenceState {
                phase: PresencePhase::Empty,
                online: HashSet::new(),
            })),
        }
    }

    /// Get a read handle to the set.
    #[must_use]
    pub fn view(&self) -> PresenceView {
        PresenceView {
            state: Arc::clone(&self.state),
        }
    }

    /// Replace the whole set with `user_ids`.
    pub fn replace_all<I>(&mut self, user_ids: I)
    where
        I: IntoIterator<Item = UserId>,
    {
        let online: HashSet<UserId> = user_ids.into_iter().collect();
        trace!(online = online.len(), "Presence: full replace");

        let mut state = self.state.write();
        state.online = online;
        state.phase = PresencePhase::Populated;
    }

    /// Apply a single-user delta.
    ///
    /// Users the client has never seen are accepted as-is. Returns `true`
    /// if membership changed.
    pub fn apply(&mut self, user_id: &str, status: &PresenceStatus) -> bool {
        let mut state = self.state.write();
        let changed = if status.is_online() {
            state.online.insert(user_id.to_string())
        } else {
            state.online.remove(user_id)
        };

        if changed {
            trace!(user = %user_id, online = status.is_online(), "Presence: member changed");
        }
        changed
    }
}

impl Default for PresenceReconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only handle to a session's presence set.
///
/// Cheap to clone; every clone sees the live set.
#[derive(Debug, Clone)]
pub struct PresenceView {
    state: Arc<RwLock<PresenceState>>,
}

impl PresenceView {
    /// Check if a user is online.
    #[must_use]
    pub fn is_online(&self, user_id: &str) -> bool {
        self.state.read().online.contains(user_id)
    }

    /// Copy of the current set of online users.
    #[must_use]
    pub fn snapshot(&self) -> HashSet<UserId> {
        self.state.read().online.clone()
    }

    /// Get the number of online users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().online.len()
    }

    /// Check if nobody is online (or nothing is known yet).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().online.is_empty()
    }

    /// Whether a full list has been received.
    #[must_use]
    pub fn phase(&self) -> PresencePhase {
        self.state.read().phase
    }
}
