//! Error types for playback management

use crate::types::PlayFailure;
use tempo_core::{TempoError, TrackId};
use tempo_storage::StorageError;
use thiserror::Error;

/// Playback errors
///
/// None of these are allowed to escape into UI rendering; each is caught at
/// the boundary where it occurs and turned into a log line or a notice.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No playable URL/URI could be produced for a track
    #[error("Cannot resolve track {track_id}: {reason}")]
    Resolution { track_id: TrackId, reason: String },

    /// The audio resource reported a decode/network error
    #[error("Audio resource error: {0}")]
    Resource(String),

    /// The platform refused to start playback without a user gesture
    #[error("Autoplay blocked: {0}")]
    AutoplayBlocked(String),

    /// Persisted state could not be written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Enqueue attempted before the engine was installed
    #[error("Queue system is not available yet")]
    QueueSystemUnavailable,

    /// Catalog or offline store failure
    #[error("Catalog error: {0}")]
    Catalog(#[from] TempoError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PlaybackError {
    /// Create a resolution error
    pub fn resolution(track_id: &TrackId, reason: impl Into<String>) -> Self {
        Self::Resolution {
            track_id: track_id.clone(),
            reason: reason.into(),
        }
    }
}

impl From<PlayFailure> for PlaybackError {
    fn from(failure: PlayFailure) -> Self {
        match failure {
            PlayFailure::NotAllowed(msg) | PlayFailure::Aborted(msg) => Self::AutoplayBlocked(msg),
            PlayFailure::NotReady => Self::Resource("not enough data buffered".to_string()),
            PlayFailure::Resource(msg) => Self::Resource(msg),
        }
    }
}

impl From<config::ConfigError> for PlaybackError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
