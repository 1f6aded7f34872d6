//! Types for catalog server API requests and responses.

use serde::{Deserialize, Serialize};
use tempo_core::{Track, TrackOrigin};

/// Configuration for connecting to a catalog server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the server (e.g., "https://music.example.com")
    pub url: String,
    /// Current access token (if authenticated)
    pub access_token: Option<String>,
}

impl ServerConfig {
    /// Create a new server config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
        }
    }

    /// Create a config with an existing token.
    pub fn with_token(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: Some(access_token.into()),
        }
    }
}

/// Server information (no auth required).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Track as returned by the server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerTrack {
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_seconds: Option<f64>,
    /// Path under the server's stream root
    pub server_path: String,
    #[serde(default)]
    pub artwork_url: Option<String>,
}

impl From<ServerTrack> for Track {
    fn from(track: ServerTrack) -> Self {
        let mut converted = Track::new(
            track.id,
            track.title,
            track.artist.unwrap_or_else(|| "Unknown Artist".to_string()),
            TrackOrigin::catalog(track.server_path),
        );
        converted.album = track.album;
        converted.duration_secs = track.duration_seconds;
        converted.artwork = track.artwork_url;
        converted
    }
}

/// Response wrapping a list of tracks.
#[derive(Debug, Deserialize)]
pub struct TracksResponse {
    pub tracks: Vec<ServerTrack>,
}
