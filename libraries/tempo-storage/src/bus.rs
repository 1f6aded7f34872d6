//! Global broadcast bus
//!
//! Named, payload-less signals. Listeners re-read whatever state they care
//! about when a signal fires; delivery order between listeners is unspecified.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::trace;

/// Named broadcast signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Something in the shared store was written
    StorageChanged,

    /// The liked track set changed
    LikedTracksChanged,
}

impl Signal {
    /// Wire name of the signal
    pub fn name(&self) -> &'static str {
        match self {
            Self::StorageChanged => "storage-changed",
            Self::LikedTracksChanged => "liked-tracks-changed",
        }
    }
}

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Signal, Listener)>>,
}

impl BusInner {
    fn remove(&self, id: u64) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|(listener_id, _, _)| *listener_id != id);
    }
}

/// Cloneable handle to a shared broadcast bus
#[derive(Clone, Default)]
pub struct BroadcastBus {
    inner: Arc<BusInner>,
}

impl BroadcastBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for a signal
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    pub fn subscribe<F>(&self, signal: Signal, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, signal, Arc::new(listener)));

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Fire a signal to every current listener
    pub fn emit(&self, signal: Signal) {
        // Snapshot first: listeners may subscribe or unsubscribe re-entrantly
        let targets: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, s, _)| *s == signal)
            .map(|(_, _, l)| Arc::clone(l))
            .collect();

        trace!(signal = signal.name(), listeners = targets.len(), "Broadcasting");

        for listener in targets {
            listener();
        }
    }

    /// Number of listeners for a signal
    pub fn listener_count(&self, signal: Signal) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, s, _)| *s == signal)
            .count()
    }
}

impl std::fmt::Debug for BroadcastBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastBus")
            .field("storage_listeners", &self.listener_count(Signal::StorageChanged))
            .field("liked_listeners", &self.listener_count(Signal::LikedTracksChanged))
            .finish()
    }
}

/// Registration handle returned by [`BroadcastBus::subscribe`]
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Stop receiving signals
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
