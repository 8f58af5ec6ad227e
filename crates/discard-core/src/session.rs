//! The caller-owned event session.
//!
//! A [`Session`] bundles one dispatcher (and so one presence set and one set
//! of observer registries) with a few counters. It does not own the
//! connection: the caller opens it, hands it to [`Session::run`] and decides
//! what to do once `run` returns.

use discard_protocol::UserId;
use discard_transport::Connection;
use std::collections::HashSet;
use tracing::{debug, trace};

use crate::dispatcher::{Dispatch, Dispatcher, MessageEvent, Observers, ServerEvent};
use crate::observer::ObserverToken;
use crate::presence::PresenceView;

/// Frame counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames of a known type that decoded cleanly.
    pub frames_routed: u64,
    /// Frames dropped as malformed or unknown.
    pub frames_dropped: u64,
}

/// One realtime event session.
#[derive(Debug, Default)]
pub struct Session {
    dispatcher: Dispatcher,
    stats: SessionStats,
}

impl Session {
    /// Create a session with an empty presence set and no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `callback` after every presence change.
    pub fn on_presence<F>(&self, callback: F) -> ObserverToken
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.dispatcher.observers().presence.register(move |_| callback())
    }

    /// Call `callback` on server updates and deletions.
    pub fn on_server_event<F>(&self, callback: F) -> ObserverToken
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        self.dispatcher.observers().servers.register(callback)
    }

    /// Call `callback` with the channel id of every new message.
    pub fn on_unread<F>(&self, callback: F) -> ObserverToken
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.dispatcher.observers().unread.register(callback)
    }

    /// Call `callback` on new, edited and deleted messages.
    pub fn on_message<F>(&self, callback: F) -> ObserverToken
    where
        F: Fn(&MessageEvent) + Send + Sync + 'static,
    {
        self.dispatcher.observers().messages.register(callback)
    }

    /// Remove an observer from whichever registry issued `token`.
    ///
    /// Returns `false` if it was already removed.
    pub fn deregister(&self, token: ObserverToken) -> bool {
        let observers = self.dispatcher.observers();
        observers.presence.deregister(token)
            || observers.servers.deregister(token)
            || observers.unread.deregister(token)
            || observers.messages.deregister(token)
    }

    /// Get handles to the observer registries, e.g. to move into a callback.
    #[must_use]
    pub fn observers(&self) -> Observers {
        self.dispatcher.observers().clone()
    }

    /// Get a read handle to the presence set.
    #[must_use]
    pub fn presence(&self) -> PresenceView {
        self.dispatcher.presence()
    }

    /// Check if a user is online.
    #[must_use]
    pub fn is_online(&self, user_id: &str) -> bool {
        self.dispatcher.presence().is_online(user_id)
    }

    /// Copy of the current set of online users.
    #[must_use]
    pub fn snapshot(&self) -> HashSet<UserId> {
        self.dispatcher.presence().snapshot()
    }

    /// Get frame counters.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Dispatch one inbound text frame.
    pub fn handle_text(&mut self, text: &str) -> Dispatch {
        let outcome = self.dispatcher.dispatch_text(text);
        match outcome {
            Dispatch::Routed(kind) => {
                self.stats.frames_routed += 1;
                trace!(kind = %kind, "Frame routed");
            }
            Dispatch::Dropped => self.stats.frames_dropped += 1,
        }
        outcome
    }

    /// Dispatch every frame `conn` delivers until it closes.
    pub async fn run<C: Connection + ?Sized>(&mut self, conn: &mut C) {
        self.run_with(conn, |_, _| {}).await;
    }

    /// Like [`run`](Self::run), also calling `inspect` with each raw frame
    /// and its outcome after dispatch.
    pub async fn run_with<C, F>(&mut self, conn: &mut C, mut inspect: F)
    where
        C: Connection + ?Sized,
        F: FnMut(&str, Dispatch),
    {
        debug!(connection = %conn.id(), "Session attached");
        while let Some(text) = conn.recv().await {
            let outcome = self.handle_text(&text);
            inspect(&text, outcome);
        }
        debug!(
            connection = %conn.id(),
            routed = self.stats.frames_routed,
            dropped = self.stats.frames_dropped,
            "Session detached"
        );
    }
}
