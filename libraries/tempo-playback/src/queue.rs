//! Play-next queue
//!
//! Persisted FIFO of explicitly enqueued tracks. The queue takes priority over
//! the active context when advancing. Each entry remembers the playlist
//! context that was selected when it was added; when a playlist-sourced entry
//! drains the queue, a one-shot restore marker is written so the next advance
//! resumes that playlist from its first track.
//!
//! ```text
//! Current: Track A (library)
//! ─────────────────────────────
//! Queue:
//!   - Track B (from "Road Trip")
//! ─────────────────────────────
//! A ends  -> B plays, queue empty, marker("Road Trip") written
//! B ends  -> marker consumed, context = "Road Trip", its first track plays
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use tempo_core::{PlaylistContext, RestoreMarker, Track};
use tempo_storage::{keys, SharedStore};
use tracing::{debug, info};

/// Store-backed play-next queue
#[derive(Clone)]
pub struct PlayQueue {
    store: SharedStore,
    // Serializes read-modify-write cycles on the queue key
    lock: Arc<Mutex<()>>,
}

impl PlayQueue {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Snapshot of queued tracks, head first
    pub fn tracks(&self) -> Vec<Track> {
        self.store.read_or_default(keys::PLAY_QUEUE)
    }

    pub fn len(&self) -> usize {
        self.tracks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks().is_empty()
    }

    /// Append a track, tagging it with the currently selected context
    ///
    /// Duplicates are allowed, including the track that is currently playing.
    pub fn enqueue(&self, mut track: Track) -> usize {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let selected: Option<PlaylistContext> = self.store.read(keys::SELECTED_PLAYLIST, None);
        track.from_playlist = selected;

        let mut queue = self.tracks();
        info!(
            track_id = %track.id,
            from_playlist = track.from_playlist.as_ref().map(|c| c.id.as_str()),
            "Adding track to queue"
        );
        queue.push(track);
        self.store.write(keys::PLAY_QUEUE, &queue);
        queue.len()
    }

    /// Remove and return the head of the queue
    ///
    /// When this empties the queue and the entry came from a playlist, a
    /// restore marker for that playlist is written.
    pub fn dequeue_next(&self) -> Option<Track> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut queue = self.tracks();
        if queue.is_empty() {
            return None;
        }
        let track = queue.remove(0);

        if queue.is_empty() {
            if let Some(context) = &track.from_playlist {
                debug!(playlist_id = %context.id, "Queue drained, writing restore marker");
                self.store
                    .write(keys::PLAYLIST_RESTORE, &RestoreMarker::new(context.clone()));
            }
            self.store.remove(keys::PLAY_QUEUE);
        } else {
            self.store.write(keys::PLAY_QUEUE, &queue);
        }

        Some(track)
    }

    /// Consume the restore marker, if one is pending
    pub fn take_restore_marker(&self) -> Option<RestoreMarker> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let marker: Option<RestoreMarker> = self.store.read(keys::PLAYLIST_RESTORE, None);
        if marker.is_some() {
            self.store.remove(keys::PLAYLIST_RESTORE);
        }
        marker
    }

    /// Whether a restore marker is waiting
    pub fn has_restore_marker(&self) -> bool {
        self.store.contains(keys::PLAYLIST_RESTORE)
    }

    /// Drop every queued entry
    pub fn clear(&self) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.remove(keys::PLAY_QUEUE);
    }
}

impl std::fmt::Debug for PlayQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayQueue").field("len", &self.len()).finish()
    }
}
