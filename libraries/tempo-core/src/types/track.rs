/// Track domain type
use super::ids::TrackId;
use super::playlist::PlaylistContext;
use serde::{Deserialize, Serialize};

/// Where a track's audio comes from
///
/// Resolved once by the source resolver; nothing else branches on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrackOrigin {
    /// Streamed from the catalog service; `path` is the library file path
    /// as reported by the server (may use `\` separators)
    Catalog { path: String },

    /// File on this device's local library
    Local { path: String },

    /// Downloaded for offline playback; the offline store knows the file
    Offline,
}

impl TrackOrigin {
    /// Catalog origin from a server file path
    pub fn catalog(path: impl Into<String>) -> Self {
        Self::Catalog { path: path.into() }
    }

    /// Local library origin from a device path
    pub fn local(path: impl Into<String>) -> Self {
        Self::Local { path: path.into() }
    }
}

/// Audio track as seen by the playback engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    /// Source of the audio
    pub origin: TrackOrigin,

    /// Duration in seconds, unknown until the resource reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,

    /// Artwork reference (URL or path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,

    /// Playlist context this track was queued from
    ///
    /// Set only when the track entered the queue while a playlist context
    /// was selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_playlist: Option<PlaylistContext>,
}

impl Track {
    /// Create a track with the required metadata
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        origin: TrackOrigin,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            origin,
            duration_secs: None,
            artwork: None,
            from_playlist: None,
        }
    }

    /// Whether the track plays from a downloaded file
    pub fn is_offline(&self) -> bool {
        matches!(self.origin, TrackOrigin::Offline)
    }
}

// Identity is the id alone; metadata may differ between catalog refreshes.
impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}
