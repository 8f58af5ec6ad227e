//! Observer registries.
//!
//! One registry per event category. A registry maps opaque tokens to
//! callbacks and invokes them in registration order. Callbacks may register
//! or deregister observers (on any registry) while being invoked.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Source of token values. Tokens are unique across all registries, so a
/// token handed to the wrong registry never removes someone else's observer.
static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque handle returned by [`ObserverRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(u64);

struct Entry<E: ?Sized> {
    token: ObserverToken,
    /// Cleared on deregistration so an in-flight pass skips the entry.
    active: AtomicBool,
    callback: Box<dyn Fn(&E) + Send + Sync>,
}

/// A set of callbacks for one event category.
///
/// Cloning yields another handle to the same registry.
pub struct ObserverRegistry<E: ?Sized> {
    entries: Arc<Mutex<Vec<Arc<Entry<E>>>>>,
}

impl<E: ?Sized> ObserverRegistry<E> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a callback.
    ///
    /// Registering the same callback twice yields two independent tokens.
    pub fn register<F>(&self, callback: F) -> ObserverToken
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let token = ObserverToken(TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push(Arc::new(Entry {
            token,
            active: AtomicBool::new(true),
            callback: Box::new(callback),
        }));
        token
    }

    /// Remove a callback.
    ///
    /// Returns `false` if the token is not registered here (already removed,
    /// or issued by another registry).
    pub fn deregister(&self, token: ObserverToken) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter().position(|entry| entry.token == token) {
            Some(index) => {
                let entry = entries.remove(index);
                entry.active.store(false, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Check if a token is currently registered.
    #[must_use]
    pub fn contains(&self, token: ObserverToken) -> bool {
        self.entries.lock().iter().any(|entry| entry.token == token)
    }

    /// Get the number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Invoke every registered callback with `event`, in registration order.
    ///
    /// The list is snapshotted first and the lock released, so callbacks can
    /// mutate any registry. Entries deregistered during the pass are skipped;
    /// entries registered during the pass wait for the next event.
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify(&self, event: &E) -> usize {
        let snapshot: Vec<Arc<Entry<E>>> = self.entries.lock().clone();

        let mut invoked = 0;
        for entry in snapshot {
            if entry.active.load(Ordering::Acquire) {
                (entry.callback)(event);
                invoked += 1;
            }
        }
        invoked
    }
}

impl<E: ?Sized> Clone for ObserverRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<E: ?Sized> Default for ObserverRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized> fmt::Debug for ObserverRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("len", &self.len())
            .finish()
    }
}
