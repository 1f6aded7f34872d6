//! Like/favorites bridge
//!
//! Routes like toggles to the catalog service, or to the offline store while
//! the catalog is unreachable. The liked id set is mirrored into the shared
//! store and a `liked-tracks-changed` signal is emitted after every successful
//! toggle so surfaces can refresh their liked indicator.

use crate::error::{PlaybackError, Result};
use std::sync::Arc;
use tempo_core::{
    CatalogService, OfflineStore, PlatformCapabilities, PlaylistContext, TempoError, TrackId,
};
use tempo_storage::{keys, SharedStore, Signal};
use tracing::{debug, info, warn};

pub struct LikesBridge {
    store: SharedStore,
    catalog: Arc<dyn CatalogService>,
    offline: Option<Arc<dyn OfflineStore>>,
    platform: Arc<dyn PlatformCapabilities>,
    // One toggle at a time so the mirrored set never interleaves
    toggle_lock: tokio::sync::Mutex<()>,
}

impl LikesBridge {
    pub fn new(
        store: SharedStore,
        catalog: Arc<dyn CatalogService>,
        offline: Option<Arc<dyn OfflineStore>>,
        platform: Arc<dyn PlatformCapabilities>,
    ) -> Self {
        Self {
            store,
            catalog,
            offline,
            platform,
            toggle_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Liked ids as last mirrored into the store
    pub fn liked_ids(&self) -> Vec<TrackId> {
        self.store.read_or_default(keys::LIKED_TRACK_IDS)
    }

    pub fn is_liked(&self, id: &TrackId) -> bool {
        self.liked_ids().contains(id)
    }

    /// Reload the liked set from its source of truth
    pub async fn refresh(&self) -> Result<Vec<TrackId>> {
        let ids = self.fetch_ids().await?;

        debug!(count = ids.len(), "Refreshed liked tracks");
        self.store.write(keys::LIKED_TRACK_IDS, &ids);
        self.store.bus().emit(Signal::LikedTracksChanged);
        Ok(ids)
    }

    /// The synthetic "Liked Songs" playlist
    pub async fn liked_songs_context(&self) -> Result<PlaylistContext> {
        let tracks = self.catalog.liked_tracks().await?;
        Ok(PlaylistContext::liked_songs(tracks))
    }

    /// Flip the liked flag of a track, returning the new value
    ///
    /// On failure nothing is mirrored and no signal is emitted.
    pub async fn toggle(&self, id: &TrackId) -> Result<bool> {
        let _guard = self.toggle_lock.lock().await;

        // The mirror may not have been filled yet this session
        let mut ids = if self.store.contains(keys::LIKED_TRACK_IDS) {
            self.liked_ids()
        } else {
            self.fetch_ids().await?
        };
        let liked = !ids.contains(id);

        if self.use_offline() {
            self.offline_store()?.set_track_liked(id, liked).await?;
        } else if liked {
            self.catalog.like_track(id).await?;
        } else {
            self.catalog.unlike_track(id).await?;
        }

        if liked {
            ids.push(id.clone());
        } else {
            ids.retain(|existing| existing != id);
        }
        self.store.write(keys::LIKED_TRACK_IDS, &ids);
        info!(track_id = %id, liked, "Like toggled");

        self.refresh_liked_songs_context(id, liked).await;
        self.store.bus().emit(Signal::LikedTracksChanged);
        Ok(liked)
    }

    async fn refresh_liked_songs_context(&self, id: &TrackId, liked: bool) {
        let selected: Option<PlaylistContext> = self.store.read(keys::SELECTED_PLAYLIST, None);
        let Some(mut context) = selected.filter(PlaylistContext::is_liked_songs) else {
            return;
        };

        if liked && !self.use_offline() {
            match self.liked_songs_context().await {
                Ok(fresh) => context = fresh,
                Err(e) => warn!(error = %e, "Failed to reload liked songs playlist"),
            }
        } else if !liked {
            context.tracks.retain(|track| &track.id != id);
        }

        self.store.write(keys::SELECTED_PLAYLIST, &Some(context));
    }

    async fn fetch_ids(&self) -> Result<Vec<TrackId>> {
        if self.use_offline() {
            return Ok(self.offline_store()?.liked_track_ids().await?);
        }
        Ok(self
            .catalog
            .liked_tracks()
            .await?
            .into_iter()
            .map(|track| track.id)
            .collect())
    }

    fn use_offline(&self) -> bool {
        !self.platform.is_online()
    }

    fn offline_store(&self) -> Result<&Arc<dyn OfflineStore>> {
        self.offline.as_ref().ok_or_else(|| {
            PlaybackError::Catalog(TempoError::network("catalog unreachable and no offline store"))
        })
    }
}

impl std::fmt::Debug for LikesBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LikesBridge")
            .field("liked", &self.liked_ids().len())
            .finish_non_exhaustive()
    }
}
