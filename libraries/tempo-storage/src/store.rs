//! Shared playback state store
//!
//! Process-wide key/value store over a [`ScopedStorage`] backend. Every write
//! is followed by a payload-less `storage-changed` broadcast; subscribers
//! re-read whatever they render. Reads never fail: missing or corrupt entries
//! come back as the caller's default.

use crate::backend::ScopedStorage;
use crate::bus::{BroadcastBus, Signal, Subscription};
use crate::compact::Compact;
use crate::keys;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, warn};

/// Quota recovery policy
#[derive(Debug, Clone)]
pub struct StorePolicy {
    /// Keys that may be evicted to make room for another write
    pub transient_keys: Vec<String>,

    /// Track list cap used for compacted writes
    pub compact_track_limit: usize,
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self {
            transient_keys: keys::DEFAULT_TRANSIENT
                .iter()
                .map(ToString::to_string)
                .collect(),
            compact_track_limit: 500,
        }
    }
}

/// What happened to a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Stored as given
    Stored,

    /// Stored after evicting transient keys
    StoredAfterEviction,

    /// A compacted projection was stored instead
    Compacted,

    /// Nothing could be stored; the previous value (if any) remains
    Dropped,
}

impl WriteOutcome {
    /// Whether some version of the value was persisted
    pub fn is_stored(self) -> bool {
        !matches!(self, Self::Dropped)
    }
}

struct StoreInner {
    backend: Arc<dyn ScopedStorage>,
    bus: BroadcastBus,
    policy: StorePolicy,
    // Keeps writes applied in call order
    write_lock: Mutex<()>,
}

/// Cloneable handle to the shared store
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<StoreInner>,
}

impl SharedStore {
    /// Store over a backend with its own bus and the default policy
    pub fn new(backend: Arc<dyn ScopedStorage>) -> Self {
        Self::with_bus(backend, BroadcastBus::new(), StorePolicy::default())
    }

    /// Store sharing an existing bus
    pub fn with_bus(backend: Arc<dyn ScopedStorage>, bus: BroadcastBus, policy: StorePolicy) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend,
                bus,
                policy,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// The bus this store broadcasts on
    pub fn bus(&self) -> &BroadcastBus {
        &self.inner.bus
    }

    /// The backend this store persists to
    pub fn backend(&self) -> &Arc<dyn ScopedStorage> {
        &self.inner.backend
    }

    /// Read a value, falling back to `default`
    ///
    /// A value that fails to deserialize is treated as absent and cleared.
    pub fn read<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.inner.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                warn!(key, error = %e, "Storage read failed");
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Discarding corrupt stored value");
                if let Err(e) = self.inner.backend.remove(key) {
                    debug!(key, error = %e, "Failed to clear corrupt value");
                }
                default
            }
        }
    }

    /// Read a value, falling back to `T::default()`
    pub fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.read(key, T::default())
    }

    /// Whether a key currently holds a value
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.inner.backend.get(key), Ok(Some(_)))
    }

    /// Persist a value and broadcast `storage-changed`
    ///
    /// Never fails. On quota pressure transient keys are evicted first, then a
    /// compacted projection is tried, and finally the write is dropped.
    pub fn write<T: Serialize + Compact>(&self, key: &str, value: &T) -> WriteOutcome {
        let outcome = {
            let _guard = self.inner.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.write_locked(key, value)
        };

        match outcome {
            WriteOutcome::Dropped => {}
            _ => self.inner.bus.emit(Signal::StorageChanged),
        }
        outcome
    }

    /// Remove a key and broadcast `storage-changed`
    pub fn remove(&self, key: &str) {
        {
            let _guard = self.inner.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = self.inner.backend.remove(key) {
                warn!(key, error = %e, "Storage remove failed");
                return;
            }
        }
        self.inner.bus.emit(Signal::StorageChanged);
    }

    /// Wipe the whole scope (logout) and broadcast
    pub fn clear(&self) {
        {
            let _guard = self.inner.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = self.inner.backend.clear() {
                error!(error = %e, "Failed to clear session storage");
            }
        }
        self.inner.bus.emit(Signal::StorageChanged);
    }

    /// Register for `storage-changed`
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.bus.subscribe(Signal::StorageChanged, listener)
    }

    fn write_locked<T: Serialize + Compact>(&self, key: &str, value: &T) -> WriteOutcome {
        let backend = &self.inner.backend;

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!(key, error = %e, "Failed to serialize value for storage");
                return WriteOutcome::Dropped;
            }
        };

        match backend.set(key, &raw) {
            Ok(()) => return WriteOutcome::Stored,
            Err(e) if e.is_quota() => {
                warn!(key, bytes = raw.len(), "Storage quota exceeded, evicting transient keys");
            }
            Err(e) => {
                error!(key, error = %e, "Storage write failed");
                return WriteOutcome::Dropped;
            }
        }

        // 1. make room by dropping transient entries that hold a value
        let mut evicted = 0usize;
        for transient in &self.inner.policy.transient_keys {
            if transient == key || !matches!(backend.get(transient), Ok(Some(_))) {
                continue;
            }
            match backend.remove(transient) {
                Ok(()) => {
                    warn!(key = %transient, "Evicted transient key");
                    evicted += 1;
                }
                Err(e) => debug!(key = %transient, error = %e, "Failed to evict transient key"),
            }
        }
        if evicted > 0 {
            match backend.set(key, &raw) {
                Ok(()) => return WriteOutcome::StoredAfterEviction,
                Err(e) if e.is_quota() => {}
                Err(e) => {
                    error!(key, error = %e, "Storage write failed after eviction");
                    return WriteOutcome::Dropped;
                }
            }
        }

        // 2. write a reduced projection
        let limit = self.inner.policy.compact_track_limit;
        if let Some(reduced) = value.compact(limit) {
            match serde_json::to_string(&reduced) {
                Ok(reduced_raw) => match backend.set(key, &reduced_raw) {
                    Ok(()) => {
                        warn!(
                            key,
                            original_bytes = raw.len(),
                            stored_bytes = reduced_raw.len(),
                            "Stored compacted value"
                        );
                        return WriteOutcome::Compacted;
                    }
                    Err(e) => debug!(key, error = %e, "Compacted write also failed"),
                },
                Err(e) => debug!(key, error = %e, "Failed to serialize compacted value"),
            }
        }

        // 3. give up
        error!(key, bytes = raw.len(), "Dropping write, value does not fit in storage");
        WriteOutcome::Dropped
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("policy", &self.inner.policy)
            .field("bus", &self.inner.bus)
            .finish_non_exhaustive()
    }
}
