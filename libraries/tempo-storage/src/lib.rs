//! Tempo Storage
//!
//! Session-scoped persistence and the shared playback state store.
//!
//! This crate provides:
//! - `ScopedStorage` backends (in-memory and file-backed, both quota aware)
//! - `BroadcastBus` for payload-less named signals
//! - `SharedStore`, the process-wide key/value store every UI surface reads
//!   and writes, which broadcasts `storage-changed` after each write
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use tempo_core::TrackId;
//! use tempo_storage::{keys, MemoryStorage, SharedStore};
//!
//! let store = SharedStore::new(Arc::new(MemoryStorage::new()));
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = seen.clone();
//! let _sub = store.subscribe(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! store.write(keys::LIKED_TRACK_IDS, &vec![TrackId::new("t1")]);
//! let liked: Vec<TrackId> = store.read(keys::LIKED_TRACK_IDS, Vec::new());
//!
//! assert_eq!(liked, vec![TrackId::new("t1")]);
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

mod backend;
mod bus;
mod compact;
mod error;
pub mod keys;
mod store;

pub use backend::{FileStorage, MemoryStorage, ScopedStorage};
pub use bus::{BroadcastBus, Signal, Subscription};
pub use compact::Compact;
pub use error::{Result, StorageError};
pub use store::{SharedStore, StorePolicy, WriteOutcome};
