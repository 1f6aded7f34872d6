//! Core types for the playback state machine

use serde::{Deserialize, Serialize};

/// State of the single audio resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerState {
    /// No track loaded
    #[default]
    Idle,

    /// Source assigned and reloaded, waiting for metadata
    Loading,

    /// Metadata available, not playing yet
    Ready,

    /// Audio is playing
    Playing,

    /// Paused mid-track (or after a resource error)
    Paused,

    /// Track reached its natural end
    Ended,
}

impl PlayerState {
    /// Whether a play call can be issued against the resource
    pub fn can_attempt_play(self) -> bool {
        matches!(self, Self::Ready | Self::Paused | Self::Ended)
    }
}

/// Kind of user input that can unlock the autoplay gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Mouse / pen
    Pointer,

    /// Touch screen
    Touch,
}

/// Signals reported by the audio resource
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// Metadata (duration) is available after a reload
    MetadataLoaded { duration_secs: Option<f64> },

    /// Enough data is buffered to play through
    CanPlayThrough,

    /// Periodic playback position
    TimeUpdate { position_secs: f64 },

    /// Natural end of track
    Ended,

    /// Decode or network failure
    Error { message: String },
}

/// Why a play call did not start playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayFailure {
    /// The platform requires a user gesture first
    NotAllowed(String),

    /// The attempt was interrupted (new source, pause)
    Aborted(String),

    /// Not enough data buffered yet
    NotReady,

    /// Decode/network failure
    Resource(String),
}

impl PlayFailure {
    /// Whether this belongs to the autoplay-blocked class
    pub fn is_autoplay_block(&self) -> bool {
        matches!(self, Self::NotAllowed(_) | Self::Aborted(_))
    }
}

impl std::fmt::Display for PlayFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAllowed(msg) => write!(f, "not allowed: {msg}"),
            Self::Aborted(msg) => write!(f, "aborted: {msg}"),
            Self::NotReady => write!(f, "not ready"),
            Self::Resource(msg) => write!(f, "resource error: {msg}"),
        }
    }
}
