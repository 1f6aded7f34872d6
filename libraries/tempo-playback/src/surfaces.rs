//! Presentation adapters
//!
//! The mini player and the expanded player render the same projection of the
//! shared store and forward user actions to the engine. They never touch the
//! audio resource and keep no playback state of their own, so they cannot
//! drift apart.

use crate::engine::PlaybackEngine;
use crate::notice::{Notice, NoticeSink};
use crate::types::Interaction;
use std::sync::{Arc, Mutex, PoisonError};
use tempo_core::{PlaybackState, PlaylistContext, RepeatMode, Track, TrackId};
use tempo_storage::{keys, SharedStore, Signal, Subscription};
use tracing::{debug, warn};

/// Read-only projection of the shared store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NowPlayingView {
    pub track_id: Option<TrackId>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub artwork: Option<String>,
    pub is_playing: bool,
    pub position_secs: f64,
    pub duration_secs: Option<f64>,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub liked: bool,
    pub queue_len: usize,
    pub context_name: Option<String>,
}

impl NowPlayingView {
    pub fn project(store: &SharedStore) -> Self {
        let state: PlaybackState = store.read_or_default(keys::PLAYBACK_STATE);
        let liked: Vec<TrackId> = store.read_or_default(keys::LIKED_TRACK_IDS);
        let queue: Vec<Track> = store.read_or_default(keys::PLAY_QUEUE);
        let context: Option<PlaylistContext> = store.read(keys::SELECTED_PLAYLIST, None);

        let current = state.current.as_ref();
        Self {
            track_id: current.map(|t| t.id.clone()),
            title: current.map(|t| t.title.clone()),
            artist: current.map(|t| t.artist.clone()),
            artwork: current.and_then(|t| t.artwork.clone()),
            is_playing: state.is_playing,
            position_secs: state.position_secs,
            duration_secs: state.duration_secs,
            shuffle: state.shuffle,
            repeat: state.repeat,
            liked: current.is_some_and(|t| liked.contains(&t.id)),
            queue_len: queue.len(),
            context_name: context.map(|c| c.name),
        }
    }

    /// Elapsed fraction for a progress bar
    pub fn progress(&self) -> f64 {
        match self.duration_secs {
            Some(duration) if duration > 0.0 => (self.position_secs / duration).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Mini,
    Expanded,
}

/// A mounted player surface
pub struct PlayerSurface {
    kind: SurfaceKind,
    engine: Arc<PlaybackEngine>,
    notices: Arc<dyn NoticeSink>,
    view: Arc<Mutex<NowPlayingView>>,
    _subscriptions: [Subscription; 2],
}

impl PlayerSurface {
    /// Mount and subscribe to both refresh signals
    pub fn mount(kind: SurfaceKind, engine: Arc<PlaybackEngine>, notices: Arc<dyn NoticeSink>) -> Self {
        let store = engine.store().clone();
        let view = Arc::new(Mutex::new(NowPlayingView::project(&store)));

        let subscriptions = [Signal::StorageChanged, Signal::LikedTracksChanged].map(|signal| {
            let view = view.clone();
            let source = store.clone();
            store.bus().subscribe(signal, move || {
                let fresh = NowPlayingView::project(&source);
                *view.lock().unwrap_or_else(PoisonError::into_inner) = fresh;
            })
        });

        debug!(?kind, "Player surface mounted");
        Self {
            kind,
            engine,
            notices,
            view,
            _subscriptions: subscriptions,
        }
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    /// Latest rendered projection
    pub fn view(&self) -> NowPlayingView {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Play/pause button
    ///
    /// Records the new intent, then reports the tap as a user interaction so
    /// the intent is applied even on the very first gesture.
    pub async fn tap_play_pause(&self) {
        self.engine.toggle_play_pause().await;
        self.engine.notify_user_interaction(Interaction::Pointer).await;
    }

    pub async fn tap_next(&self) {
        self.engine.notify_user_interaction(Interaction::Pointer).await;
        self.engine.next().await;
    }

    pub async fn tap_previous(&self) {
        self.engine.notify_user_interaction(Interaction::Pointer).await;
        self.engine.previous().await;
    }

    pub fn seek(&self, position_secs: f64) {
        self.engine.seek(position_secs);
    }

    pub fn toggle_shuffle(&self) -> bool {
        self.engine.toggle_shuffle()
    }

    pub fn cycle_repeat(&self) -> RepeatMode {
        self.engine.cycle_repeat_mode()
    }

    /// Heart button on the current track
    pub async fn tap_like(&self) {
        let Some(track_id) = self.view().track_id else {
            return;
        };
        if let Err(e) = self.engine.toggle_like(&track_id).await {
            warn!(track_id = %track_id, error = %e, "Like toggle failed");
            self.notices.post(Notice::LikeFailed { track_id });
        }
    }

    /// Unmount, dropping both subscriptions
    pub fn unmount(self) {
        debug!(kind = ?self.kind, "Player surface unmounted");
    }
}

impl std::fmt::Debug for PlayerSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSurface")
            .field("kind", &self.kind)
            .field("view", &self.view())
            .finish_non_exhaustive()
    }
}
