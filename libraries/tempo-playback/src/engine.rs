//! Playback engine
//!
//! Owns the single audio resource and drives it from the shared store. The
//! store holds the *intended* state (current track, playing flag, modes);
//! the engine reconciles the resource with it and reports progress back.
//!
//! ```text
//!            set_source+reload        metadata/canplay          play() ok
//!   Idle ─────────────────────> Loading ──────────────> Ready ─────────────> Playing
//!    ^                                                    ^  <───── pause ────  │
//!    │ current = None                                     │                     │ ended
//!    └──────────────────────── advance ────────────── Ended <───────────────────┘
//! ```
//!
//! Play attempts are gated three ways:
//! - the autoplay gate must be open (first user interaction)
//! - the resource must be ready (a later readiness signal re-attempts)
//! - only one attempt may be in flight (extra requests are dropped)
//!
//! A generation counter is bumped on every load and pause; a play attempt
//! that resolves under an older generation is stale and ignored.
//!
//! After a resource error the engine holds until an explicit play or skip;
//! other store writes never retry the broken track.

use crate::config::{EngineConfig, PlaybackSettings};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::likes::LikesBridge;
use crate::notice::{Notice, NoticeSink};
use crate::queue::PlayQueue;
use crate::resolver::TrackSourceResolver;
use crate::resource::AudioResource;
use crate::shuffle;
use crate::types::{Interaction, PlayFailure, PlayerState, ResourceEvent};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tempo_core::{
    CatalogService, OfflineStore, PlatformCapabilities, PlaybackState, PlaylistContext,
    RepeatMode, Track, TrackId, TrackOrigin,
};
use tempo_storage::{keys, Compact, SharedStore, Subscription, WriteOutcome};
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Collaborators handed to [`PlaybackEngine::new`]
pub struct EngineParts {
    pub store: SharedStore,
    pub resource: Arc<dyn AudioResource>,
    pub catalog: Arc<dyn CatalogService>,
    pub offline: Option<Arc<dyn OfflineStore>>,
    pub platform: Arc<dyn PlatformCapabilities>,
    pub notices: Arc<dyn NoticeSink>,
    pub config: EngineConfig,
}

#[derive(Debug, Default)]
struct Machine {
    state: PlayerState,
    loaded: Option<TrackId>,
    // Track whose resolution failed; not retried until explicitly played again
    unresolved: Option<TrackId>,
    intent_playing: bool,
    gate_open: bool,
    attempt_in_flight: bool,
    // Set after a resource error; the next attempt reloads first
    needs_reload: bool,
    // Set after a resource error; only an explicit user action lifts it
    error_hold: bool,
    generation: u64,
    pending_seek: Option<f64>,
    last_persisted_position: f64,
}

/// The playback state machine
pub struct PlaybackEngine {
    store: SharedStore,
    queue: PlayQueue,
    resolver: TrackSourceResolver,
    likes: LikesBridge,
    resource: Arc<dyn AudioResource>,
    catalog: Arc<dyn CatalogService>,
    notices: Arc<dyn NoticeSink>,
    settings: PlaybackSettings,
    machine: Mutex<Machine>,
    // Serializes source reconciliation across awaits
    load_lock: tokio::sync::Mutex<()>,
    // Serializes read-modify-write of the playback state key
    state_lock: Mutex<()>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackEngine {
    pub fn new(parts: EngineParts) -> Arc<Self> {
        let EngineParts {
            store,
            resource,
            catalog,
            offline,
            platform,
            notices,
            config,
        } = parts;

        let resolver =
            TrackSourceResolver::new(config.stream_base_url(), offline.clone(), platform.clone());
        let likes = LikesBridge::new(store.clone(), catalog.clone(), offline, platform);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Arc::new(Self {
            queue: PlayQueue::new(store.clone()),
            store,
            resolver,
            likes,
            resource,
            catalog,
            notices,
            settings: config.playback,
            machine: Mutex::new(Machine::default()),
            load_lock: tokio::sync::Mutex::new(()),
            state_lock: Mutex::new(()),
            events,
        })
    }

    // ===== Accessors =====

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn resolver(&self) -> &TrackSourceResolver {
        &self.resolver
    }

    pub fn likes(&self) -> &LikesBridge {
        &self.likes
    }

    /// Persisted (intended) playback state
    pub fn playback_state(&self) -> PlaybackState {
        self.store.read_or_default(keys::PLAYBACK_STATE)
    }

    /// Actual state of the audio resource
    pub fn player_state(&self) -> PlayerState {
        self.machine().state
    }

    pub fn is_gate_open(&self) -> bool {
        self.machine().gate_open
    }

    pub fn intends_to_play(&self) -> bool {
        self.machine().intent_playing
    }

    /// Selected playlist, if any
    pub fn selected_context(&self) -> Option<PlaylistContext> {
        self.store.read(keys::SELECTED_PLAYLIST, None)
    }

    /// Tracks next/previous walk through: the selected playlist, else the library
    pub fn active_context(&self) -> Vec<Track> {
        self.context_tracks(&self.playback_state())
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    // ===== Lifecycle =====

    /// Reload persisted state on start-up
    ///
    /// A persisted playing flag is kept as intent; nothing plays until the
    /// first user interaction opens the autoplay gate.
    pub async fn restore(&self) {
        if !self.store.contains(keys::PLAYBACK_STATE) {
            self.update_state(|s| {
                s.shuffle = self.settings.shuffle;
                s.repeat = self.settings.repeat;
            });
        }

        let state = self.playback_state();
        {
            let mut m = self.machine();
            m.intent_playing = state.is_playing;
            m.gate_open = false;
            m.last_persisted_position = state.position_secs;
            m.pending_seek = (state.current.is_some() && state.position_secs > 0.0)
                .then_some(state.position_secs);
        }
        info!(
            track_id = state.current.as_ref().map(|t| t.id.as_str()),
            playing = state.is_playing,
            queued = self.queue.len(),
            "Restored playback state"
        );

        self.sync().await;
    }

    /// Reconcile the audio resource with the store
    ///
    /// Idempotent; called after every `storage-changed` broadcast.
    pub async fn sync(&self) {
        {
            let _load = self.load_lock.lock().await;
            self.sync_source().await;
        }
        self.apply_intent().await;
    }

    /// Run [`sync`](Self::sync) whenever the store broadcasts
    pub fn spawn_observer(self: &Arc<Self>) -> StoreObserver {
        let wake = Arc::new(Notify::new());
        let waker = wake.clone();
        let subscription = self.store.subscribe(move || waker.notify_one());

        let engine = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            loop {
                wake.notified().await;
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                engine.sync().await;
            }
        });

        StoreObserver {
            _subscription: subscription,
            task,
        }
    }

    // ===== Transport =====

    /// Play a track now
    pub async fn play_track(&self, track: Track) {
        self.start_track(track).await;
    }

    /// Select a playlist and play one of its tracks
    pub async fn play_from_context(&self, context: PlaylistContext, track: Track) {
        info!(playlist_id = %context.id, track_id = %track.id, "Playing from playlist");
        self.write_tracked(keys::SELECTED_PLAYLIST, &Some(context));
        self.start_track(track).await;
    }

    /// Return to the unscoped library
    pub fn clear_selected_context(&self) {
        self.store.remove(keys::SELECTED_PLAYLIST);
    }

    /// Install the global library list
    pub fn set_library(&self, tracks: Vec<Track>) {
        debug!(count = tracks.len(), "Setting library");
        self.update_state(|s| s.library = tracks);
    }

    /// Flip the intended playing flag
    ///
    /// With the autoplay gate closed this only records intent.
    pub async fn toggle_play_pause(&self) {
        let state = self.playback_state();
        if state.current.is_none() {
            debug!("Nothing loaded, starting active context");
            self.advance().await;
            return;
        }

        let held = std::mem::take(&mut self.machine().error_hold);
        if held && state.is_playing {
            // The stored intent never changed; the tap is a retry
            info!("Retrying after resource error");
            self.machine().intent_playing = true;
            self.attempt_play().await;
            return;
        }

        let playing = !state.is_playing;
        self.machine().intent_playing = playing;
        self.update_state(|s| s.is_playing = playing);

        if playing {
            self.attempt_play().await;
        } else {
            self.pause_resource();
        }
    }

    /// Skip to the next track
    pub async fn next(&self) {
        self.advance().await;
    }

    /// Go to the previous track, or restart the current one at the start of
    /// the context
    pub async fn previous(&self) {
        let state = self.playback_state();
        let Some(current) = state.current.as_ref() else {
            return;
        };

        let context = self.context_tracks(&state);
        match context.iter().position(|t| t.id == current.id) {
            Some(index) if index > 0 => self.start_track(context[index - 1].clone()).await,
            _ => self.rewind(),
        }
    }

    /// Move the playhead
    pub fn seek(&self, position_secs: f64) {
        if !position_secs.is_finite() {
            return;
        }
        let state = self.playback_state();
        if state.current.is_none() {
            return;
        }

        let mut target = position_secs.max(0.0);
        if let Some(duration) = state.duration_secs {
            target = target.min(duration);
        }

        self.resource.seek(target);
        self.machine().last_persisted_position = target;
        self.update_state(|s| s.position_secs = target);
    }

    pub fn toggle_shuffle(&self) -> bool {
        let state = self.update_state(|s| s.shuffle = !s.shuffle);
        info!(shuffle = state.shuffle, "Shuffle toggled");
        state.shuffle
    }

    pub fn cycle_repeat_mode(&self) -> RepeatMode {
        let state = self.update_state(|s| s.repeat = s.repeat.cycle());
        info!(repeat = %state.repeat, "Repeat mode changed");
        state.repeat
    }

    /// Append to the play-next queue, returning the new length
    pub fn add_to_queue(&self, track: Track) -> usize {
        let length = self.queue.enqueue(track);
        self.emit(PlaybackEvent::QueueChanged { length });
        length
    }

    pub fn queue_snapshot(&self) -> Vec<Track> {
        self.queue.tracks()
    }

    pub fn clear_queue(&self) {
        self.queue.clear();
        self.emit(PlaybackEvent::QueueChanged { length: 0 });
    }

    /// Flip the liked flag of a track
    pub async fn toggle_like(&self, id: &TrackId) -> Result<bool> {
        self.likes.toggle(id).await
    }

    /// A qualifying user gesture happened
    ///
    /// Opens the autoplay gate and applies the last intended state once.
    pub async fn notify_user_interaction(&self, interaction: Interaction) {
        let opened = {
            let mut m = self.machine();
            let was_open = m.gate_open;
            m.gate_open = true;
            !was_open
        };
        if opened {
            info!(?interaction, "Autoplay gate opened");
        }
        self.attempt_play().await;
    }

    /// Feed a signal from the audio resource
    pub async fn handle_resource_event(&self, event: ResourceEvent) {
        match event {
            ResourceEvent::MetadataLoaded { duration_secs } => {
                let pending_seek = {
                    let mut m = self.machine();
                    if m.loaded.is_none() {
                        return;
                    }
                    if m.state == PlayerState::Loading {
                        self.set_state(&mut m, PlayerState::Ready);
                    }
                    m.pending_seek.take()
                };
                if let Some(position) = pending_seek {
                    debug!(position, "Resuming at persisted position");
                    self.resource.seek(position);
                }
                self.update_state(|s| {
                    s.duration_secs =
                        duration_secs.or_else(|| s.current.as_ref().and_then(|t| t.duration_secs));
                });
                self.attempt_play().await;
            }
            ResourceEvent::CanPlayThrough => {
                {
                    let mut m = self.machine();
                    if m.loaded.is_none() {
                        return;
                    }
                    if m.state == PlayerState::Loading {
                        self.set_state(&mut m, PlayerState::Ready);
                    }
                }
                self.attempt_play().await;
            }
            ResourceEvent::TimeUpdate { position_secs } => self.persist_position(position_secs),
            ResourceEvent::Ended => self.on_track_ended().await,
            ResourceEvent::Error { message } => self.on_resource_error(message),
        }
    }

    // ===== Internals =====

    fn machine(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PlaybackEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn set_state(&self, m: &mut Machine, state: PlayerState) {
        if m.state != state {
            debug!(from = ?m.state, to = ?state, "Player state changed");
            m.state = state;
            self.emit(PlaybackEvent::StateChanged { state });
        }
    }

    fn update_state<F: FnOnce(&mut PlaybackState)>(&self, f: F) -> PlaybackState {
        let _guard = self.state_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.playback_state();
        f(&mut state);
        state.updated_at = chrono::Utc::now().timestamp();
        self.write_tracked(keys::PLAYBACK_STATE, &state);
        state
    }

    /// Write a key, telling the user when the play queue was evicted for it
    fn write_tracked<T: Serialize + Compact>(&self, key: &str, value: &T) {
        let had_queue = self.store.contains(keys::PLAY_QUEUE);
        let outcome = self.store.write(key, value);

        if had_queue
            && outcome == WriteOutcome::StoredAfterEviction
            && !self.store.contains(keys::PLAY_QUEUE)
        {
            warn!(key, "Play queue evicted to free storage");
            self.notices.post(Notice::QueueDropped);
            self.emit(PlaybackEvent::QueueChanged { length: 0 });
        }
    }

    fn context_tracks(&self, state: &PlaybackState) -> Vec<Track> {
        match self.selected_context() {
            Some(context) => context.tracks,
            None => state.library.clone(),
        }
    }

    async fn start_track(&self, track: Track) {
        let same = {
            let mut m = self.machine();
            m.unresolved = None;
            m.error_hold = false;
            m.intent_playing = true;
            m.loaded.as_ref() == Some(&track.id)
        };

        let duration = track.duration_secs;
        self.update_state(|s| {
            s.current = Some(track);
            s.is_playing = true;
            s.position_secs = 0.0;
            s.duration_secs = duration;
        });

        if same {
            self.resource.seek(0.0);
            self.machine().last_persisted_position = 0.0;
        }
        self.sync().await;
    }

    async fn advance(&self) {
        match self.select_next() {
            Some(track) => {
                debug!(track_id = %track.id, "Advancing");
                self.start_track(track).await;
            }
            None => {
                info!("End of context, stopping");
                self.machine().intent_playing = false;
                self.update_state(|s| {
                    s.current = None;
                    s.is_playing = false;
                    s.position_secs = 0.0;
                    s.duration_secs = None;
                });
                self.sync().await;
            }
        }
    }

    /// Queue, then restore marker, then shuffle pick, then linear successor
    fn select_next(&self) -> Option<Track> {
        if let Some(track) = self.queue.dequeue_next() {
            self.emit(PlaybackEvent::QueueChanged {
                length: self.queue.len(),
            });
            return Some(track);
        }

        if let Some(marker) = self.queue.take_restore_marker() {
            info!(playlist_id = %marker.context.id, "Restoring playlist after queue");
            let first = marker.context.first().cloned();
            self.write_tracked(keys::SELECTED_PLAYLIST, &Some(marker.context));
            if first.is_some() {
                return first;
            }
        }

        let state = self.playback_state();
        let context = self.context_tracks(&state);

        if state.shuffle {
            return shuffle::pick_random(&context).cloned();
        }

        let successor = match &state.current {
            None => context.first().cloned(),
            Some(current) => context
                .iter()
                .position(|t| t.id == current.id)
                .and_then(|index| context.get(index + 1))
                .cloned(),
        };

        successor.or_else(|| match state.repeat {
            RepeatMode::All => context.first().cloned(),
            _ => None,
        })
    }

    async fn sync_source(&self) {
        let state = self.playback_state();
        let (loaded, unresolved) = {
            let m = self.machine();
            (m.loaded.clone(), m.unresolved.clone())
        };

        match state.current {
            None => {
                if loaded.is_some() || unresolved.is_some() {
                    self.unload();
                }
            }
            Some(track) => {
                let up_to_date = loaded.as_ref() == Some(&track.id)
                    || unresolved.as_ref() == Some(&track.id);
                if !up_to_date {
                    self.load(track, loaded).await;
                }
            }
        }

        self.machine().intent_playing = state.is_playing;
    }

    async fn load(&self, track: Track, previous: Option<TrackId>) {
        {
            let mut m = self.machine();
            m.generation += 1;
        }

        match self.resolver.resolve(&track).await {
            Ok(url) => {
                {
                    let mut m = self.machine();
                    m.loaded = Some(track.id.clone());
                    m.unresolved = None;
                    m.needs_reload = false;
                    m.error_hold = false;
                    self.set_state(&mut m, PlayerState::Loading);
                }
                info!(track_id = %track.id, title = %track.title, "Loading track");
                self.resource.set_source(&url);
                self.resource.reload();
                self.emit(PlaybackEvent::TrackChanged {
                    track_id: track.id.clone(),
                    previous_track_id: previous,
                });
                self.record_recently_played(&track);
            }
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "Track could not be resolved");
                let was_playing = {
                    let mut m = self.machine();
                    let was_playing = m.state == PlayerState::Playing;
                    m.loaded = None;
                    m.unresolved = Some(track.id.clone());
                    m.pending_seek = None;
                    self.set_state(&mut m, PlayerState::Paused);
                    was_playing
                };
                if was_playing {
                    self.resource.pause();
                }
                self.emit(PlaybackEvent::Error {
                    message: e.to_string(),
                });
                self.notices.post(Notice::TrackUnavailable {
                    title: track.title,
                    reason: e.to_string(),
                });
            }
        }
    }

    fn unload(&self) {
        let was_active = {
            let mut m = self.machine();
            m.generation += 1;
            m.loaded = None;
            m.unresolved = None;
            m.pending_seek = None;
            m.needs_reload = false;
            m.error_hold = false;
            let was_active = m.state != PlayerState::Idle;
            self.set_state(&mut m, PlayerState::Idle);
            was_active
        };
        if was_active {
            debug!("Unloading resource");
            self.resource.pause();
        }
    }

    async fn apply_intent(&self) {
        let intent = self.machine().intent_playing;
        if intent {
            self.attempt_play().await;
        } else {
            self.pause_resource();
        }
    }

    fn pause_resource(&self) {
        let was_playing = {
            let mut m = self.machine();
            // Invalidates any attempt still in flight
            m.generation += 1;
            let was_playing = m.state == PlayerState::Playing;
            if was_playing {
                self.set_state(&mut m, PlayerState::Paused);
            }
            was_playing
        };
        if was_playing {
            self.resource.pause();
        }
    }

    async fn attempt_play(&self) {
        loop {
            let generation = {
                let mut m = self.machine();
                if !m.intent_playing || m.loaded.is_none() {
                    return;
                }
                if m.error_hold {
                    debug!("Holding after resource error");
                    return;
                }
                if !m.gate_open {
                    debug!("Autoplay gate closed, keeping play intent");
                    return;
                }
                if m.attempt_in_flight {
                    debug!("Play attempt already in flight");
                    return;
                }
                if m.needs_reload {
                    m.needs_reload = false;
                    self.set_state(&mut m, PlayerState::Loading);
                    drop(m);
                    debug!("Reloading resource after error");
                    self.resource.reload();
                    return;
                }
                if !m.state.can_attempt_play() {
                    return;
                }
                m.attempt_in_flight = true;
                m.generation
            };

            let result = self.resource.play().await;
            if !self.finish_attempt(generation, result) {
                return;
            }
        }
    }

    /// Returns whether a fresh attempt should be made
    fn finish_attempt(&self, generation: u64, result: std::result::Result<(), PlayFailure>) -> bool {
        let mut m = self.machine();
        m.attempt_in_flight = false;

        if m.generation != generation {
            debug!("Ignoring stale play attempt");
            let intent = m.intent_playing;
            let retry = intent && m.gate_open && m.state.can_attempt_play();
            drop(m);
            if result.is_ok() && !intent {
                self.resource.pause();
            }
            return retry;
        }

        match result {
            Ok(()) => {
                self.set_state(&mut m, PlayerState::Playing);
            }
            Err(failure) if failure.is_autoplay_block() => {
                let err = PlaybackError::from(failure);
                info!(error = %err, "Waiting for user interaction");
                m.gate_open = false;
            }
            Err(PlayFailure::NotReady) => {
                debug!("Resource not ready, waiting for readiness signal");
            }
            Err(failure) => {
                let err = PlaybackError::from(failure);
                warn!(error = %err, "Play failed");
                m.needs_reload = true;
                m.error_hold = true;
                self.set_state(&mut m, PlayerState::Paused);
                drop(m);
                self.emit(PlaybackEvent::Error {
                    message: err.to_string(),
                });
            }
        }
        false
    }

    fn on_resource_error(&self, message: String) {
        {
            let mut m = self.machine();
            if m.loaded.is_none() {
                return;
            }
            m.generation += 1;
            m.needs_reload = true;
            m.error_hold = true;
            self.set_state(&mut m, PlayerState::Paused);
        }
        let err = PlaybackError::Resource(message);
        warn!(error = %err, "Pausing until the user retries");
        self.emit(PlaybackEvent::Error {
            message: err.to_string(),
        });
    }

    async fn on_track_ended(&self) {
        let finished = {
            let mut m = self.machine();
            if m.loaded.is_none() {
                return;
            }
            self.set_state(&mut m, PlayerState::Ended);
            m.loaded.clone()
        };
        if let Some(track_id) = finished {
            self.emit(PlaybackEvent::TrackFinished { track_id });
        }

        if self.playback_state().repeat == RepeatMode::One {
            debug!("Repeat one, restarting track");
            self.rewind();
            self.attempt_play().await;
            return;
        }

        self.advance().await;
    }

    fn rewind(&self) {
        self.resource.seek(0.0);
        self.machine().last_persisted_position = 0.0;
        self.update_state(|s| s.position_secs = 0.0);
    }

    fn persist_position(&self, position_secs: f64) {
        if !position_secs.is_finite() {
            return;
        }
        {
            let mut m = self.machine();
            if m.loaded.is_none() {
                return;
            }
            let granularity = self.settings.position_granularity_secs;
            let bucket = (position_secs / granularity).floor();
            if bucket == (m.last_persisted_position / granularity).floor() {
                return;
            }
            m.last_persisted_position = position_secs;
        }
        self.update_state(|s| s.position_secs = position_secs);
    }

    fn record_recently_played(&self, track: &Track) {
        if matches!(track.origin, TrackOrigin::Local { .. }) {
            return;
        }
        let catalog = self.catalog.clone();
        let id = track.id.clone();
        tokio::spawn(async move {
            if let Err(e) = catalog.record_recently_played(&id).await {
                debug!(track_id = %id, error = %e, "Failed to record recently played");
            }
        });
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("machine", &*self.machine())
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

/// Keeps the engine synced with the store until dropped
pub struct StoreObserver {
    _subscription: Subscription,
    task: JoinHandle<()>,
}

impl Drop for StoreObserver {
    fn drop(&mut self) {
        self.task.abort();
    }
}
