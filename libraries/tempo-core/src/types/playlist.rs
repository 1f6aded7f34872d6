//! Playlist context types

use super::ids::TrackId;
use super::track::Track;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Id of the synthetic "Liked Songs" playlist
pub const LIKED_SONGS_PLAYLIST_ID: &str = "liked-songs";

/// Ordered track list the user is currently "inside" (playlist, album)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistContext {
    pub id: String,
    pub name: String,
    pub tracks: Vec<Track>,
}

impl PlaylistContext {
    /// Create a context
    pub fn new(id: impl Into<String>, name: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tracks,
        }
    }

    /// The synthetic "Liked Songs" playlist
    pub fn liked_songs(tracks: Vec<Track>) -> Self {
        Self::new(LIKED_SONGS_PLAYLIST_ID, "Liked Songs", tracks)
    }

    /// Whether this is the synthetic "Liked Songs" playlist
    pub fn is_liked_songs(&self) -> bool {
        self.id == LIKED_SONGS_PLAYLIST_ID
    }

    /// First track of the context
    pub fn first(&self) -> Option<&Track> {
        self.tracks.first()
    }

    /// Index of a track by id
    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the context has no tracks
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// One-shot record that reinstates a playlist context once a
/// playlist-sourced queue has drained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreMarker {
    pub context: PlaylistContext,

    /// Unix timestamp (seconds) of creation
    pub created_at: i64,
}

impl RestoreMarker {
    /// Create a marker for a context
    pub fn new(context: PlaylistContext) -> Self {
        Self {
            context,
            created_at: Utc::now().timestamp(),
        }
    }
}
