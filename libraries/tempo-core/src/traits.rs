//! Collaborator traits consumed by the playback engine
//!
//! The engine never talks to the network or the file system directly. These
//! traits are the narrow seams through which it reaches the catalog service,
//! the offline download store, and the host platform.

use crate::error::Result;
use crate::types::{Track, TrackId};
use async_trait::async_trait;

/// Remote catalog / streaming service
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Tracks the current user has liked
    async fn liked_tracks(&self) -> Result<Vec<Track>>;

    /// Mark a track as liked
    async fn like_track(&self, id: &TrackId) -> Result<()>;

    /// Remove a track from the liked set
    async fn unlike_track(&self, id: &TrackId) -> Result<()>;

    /// Record that a track started playing
    ///
    /// Callers treat this as fire-and-forget; a failure never blocks playback.
    async fn record_recently_played(&self, id: &TrackId) -> Result<()>;

    /// Ordered tracks of a playlist
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>>;
}

/// Offline download store
#[async_trait]
pub trait OfflineStore: Send + Sync {
    /// Whether a downloaded file exists for the track
    async fn is_track_offline(&self, id: &TrackId) -> bool;

    /// Device URI of the downloaded file, if one is registered
    async fn offline_track_uri(&self, id: &TrackId) -> Option<String>;

    /// Liked track ids recorded while offline
    async fn liked_track_ids(&self) -> Result<Vec<TrackId>> {
        Ok(Vec::new())
    }

    /// Record a like/unlike while offline
    async fn set_track_liked(&self, id: &TrackId, liked: bool) -> Result<()> {
        let _ = (id, liked);
        Err(crate::error::TempoError::storage(
            "offline likes not supported by this store",
        ))
    }
}

/// Host platform capability probe
pub trait PlatformCapabilities: Send + Sync {
    /// Whether the platform can store and play downloaded files
    fn has_offline_support(&self) -> bool;

    /// Whether the catalog service is currently reachable
    fn is_online(&self) -> bool {
        true
    }
}
