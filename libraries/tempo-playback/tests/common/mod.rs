//! Hand-written fakes shared by the engine integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempo_core::{
    CatalogService, OfflineStore, PlatformCapabilities, PlaybackState, PlaylistContext,
    TempoError, Track, TrackId, TrackOrigin,
};
use tempo_playback::{
    AudioResource, EngineConfig, EngineParts, NoticeBoard, PlayFailure, PlaybackEngine,
    ResourceEvent,
};
use tempo_storage::{keys, MemoryStorage, ScopedStorage, SharedStore};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetSource(String),
    Reload,
    Play,
    Pause,
    Seek(f64),
}

/// Audio resource that records every call
#[derive(Default)]
pub struct FakeResource {
    calls: Mutex<Vec<Call>>,
    results: Mutex<VecDeque<Result<(), PlayFailure>>>,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl FakeResource {
    /// Queue the outcome of the next `play` call (default is success)
    pub fn fail_next_play(&self, failure: PlayFailure) {
        self.results.lock().unwrap().push_back(Err(failure));
    }

    /// Make `play` wait until the returned notify fires
    pub fn hold_play(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matcher: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matcher(c)).count()
    }

    pub fn plays(&self) -> usize {
        self.count(|c| *c == Call::Play)
    }

    pub fn sources(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Call::SetSource(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl AudioResource for FakeResource {
    fn set_source(&self, url: &str) {
        self.calls.lock().unwrap().push(Call::SetSource(url.to_string()));
    }

    fn reload(&self) {
        self.calls.lock().unwrap().push(Call::Reload);
    }

    async fn play(&self) -> Result<(), PlayFailure> {
        self.calls.lock().unwrap().push(Call::Play);
        let hold = self.hold.lock().unwrap().take();
        if let Some(notify) = hold {
            notify.notified().await;
        }
        self.results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    fn pause(&self) {
        self.calls.lock().unwrap().push(Call::Pause);
    }

    fn seek(&self, position_secs: f64) {
        self.calls.lock().unwrap().push(Call::Seek(position_secs));
    }
}

/// In-memory catalog
#[derive(Default)]
pub struct FakeCatalog {
    pub tracks: Mutex<HashMap<TrackId, Track>>,
    pub liked: Mutex<Vec<TrackId>>,
    pub fail: AtomicBool,
    pub hang_recently_played: AtomicBool,
    pub recently_played: AtomicUsize,
}

impl FakeCatalog {
    fn check(&self) -> tempo_core::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(TempoError::network("catalog down"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn liked_tracks(&self) -> tempo_core::Result<Vec<Track>> {
        self.check()?;
        let tracks = self.tracks.lock().unwrap();
        Ok(self
            .liked
            .lock()
            .unwrap()
            .iter()
            .map(|id| {
                tracks
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| track(id.as_str()))
            })
            .collect())
    }

    async fn like_track(&self, id: &TrackId) -> tempo_core::Result<()> {
        self.check()?;
        self.liked.lock().unwrap().push(id.clone());
        Ok(())
    }

    async fn unlike_track(&self, id: &TrackId) -> tempo_core::Result<()> {
        self.check()?;
        self.liked.lock().unwrap().retain(|liked| liked != id);
        Ok(())
    }

    async fn record_recently_played(&self, _id: &TrackId) -> tempo_core::Result<()> {
        if self.hang_recently_played.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.recently_played.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> tempo_core::Result<Vec<Track>> {
        self.check()?;
        Err(TempoError::not_found("playlist", playlist_id))
    }
}

/// Offline download store
#[derive(Default)]
pub struct FakeOffline {
    pub files: Mutex<HashMap<TrackId, String>>,
    pub liked: Mutex<Vec<TrackId>>,
}

#[async_trait]
impl OfflineStore for FakeOffline {
    async fn is_track_offline(&self, id: &TrackId) -> bool {
        self.files.lock().unwrap().contains_key(id)
    }

    async fn offline_track_uri(&self, id: &TrackId) -> Option<String> {
        self.files.lock().unwrap().get(id).cloned()
    }

    async fn liked_track_ids(&self) -> tempo_core::Result<Vec<TrackId>> {
        Ok(self.liked.lock().unwrap().clone())
    }

    async fn set_track_liked(&self, id: &TrackId, liked: bool) -> tempo_core::Result<()> {
        let mut ids = self.liked.lock().unwrap();
        if liked {
            ids.push(id.clone());
        } else {
            ids.retain(|existing| existing != id);
        }
        Ok(())
    }
}

pub struct FakePlatform {
    pub offline_support: AtomicBool,
    pub online: AtomicBool,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            offline_support: AtomicBool::new(true),
            online: AtomicBool::new(true),
        }
    }
}

impl PlatformCapabilities for FakePlatform {
    fn has_offline_support(&self) -> bool {
        self.offline_support.load(Ordering::SeqCst)
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

pub fn track(id: &str) -> Track {
    Track::new(
        id,
        format!("Track {id}"),
        "Artist",
        TrackOrigin::catalog(format!("music/{id}.mp3")),
    )
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

pub fn context(id: &str, ids: &[&str]) -> PlaylistContext {
    PlaylistContext::new(id, format!("Playlist {id}"), tracks(ids))
}

pub struct Harness {
    pub engine: Arc<PlaybackEngine>,
    pub store: SharedStore,
    pub resource: Arc<FakeResource>,
    pub catalog: Arc<FakeCatalog>,
    pub offline: Arc<FakeOffline>,
    pub platform: Arc<FakePlatform>,
    pub notices: Arc<NoticeBoard>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_backend(Arc::new(MemoryStorage::new()))
    }

    pub fn with_backend(backend: Arc<dyn ScopedStorage>) -> Self {
        let store = SharedStore::new(backend);
        let resource = Arc::new(FakeResource::default());
        let catalog = Arc::new(FakeCatalog::default());
        let offline = Arc::new(FakeOffline::default());
        let platform = Arc::new(FakePlatform::default());
        let notices = Arc::new(NoticeBoard::new());

        let engine = PlaybackEngine::new(EngineParts {
            store: store.clone(),
            resource: resource.clone(),
            catalog: catalog.clone(),
            offline: Some(offline.clone() as Arc<dyn OfflineStore>),
            platform: platform.clone(),
            notices: notices.clone(),
            config: EngineConfig::default(),
        });

        Self {
            engine,
            store,
            resource,
            catalog,
            offline,
            platform,
            notices,
        }
    }

    /// Restore and unlock the autoplay gate, as after a first tap
    pub async fn started() -> Self {
        let harness = Self::new();
        harness.engine.restore().await;
        harness
            .engine
            .notify_user_interaction(tempo_playback::Interaction::Pointer)
            .await;
        harness
    }

    pub fn state(&self) -> PlaybackState {
        self.store.read_or_default(keys::PLAYBACK_STATE)
    }

    pub fn current_id(&self) -> Option<String> {
        self.state().current.map(|t| t.id.to_string())
    }

    pub fn selected_context_id(&self) -> Option<String> {
        self.store
            .read::<Option<PlaylistContext>>(keys::SELECTED_PLAYLIST, None)
            .map(|c| c.id)
    }

    /// Report the resource as loaded
    pub async fn loaded(&self) {
        self.engine
            .handle_resource_event(ResourceEvent::MetadataLoaded {
                duration_secs: Some(200.0),
            })
            .await;
    }

    /// Report the natural end of the current track, then load the next
    pub async fn finish_track(&self) {
        self.engine.handle_resource_event(ResourceEvent::Ended).await;
        self.loaded().await;
    }
}
