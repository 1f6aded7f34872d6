//! Playback state types shared between the engine and UI surfaces
use super::track::Track;
use serde::{Deserialize, Serialize};

/// Repeat mode for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "off" => Some(Self::Off),
            "all" => Some(Self::All),
            "one" => Some(Self::One),
            _ => None,
        }
    }

    /// Next mode in the off → all → one → off cycle
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What is currently playing - the shared store's core record
///
/// Every UI surface renders a read-only projection of this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Current track (if any)
    pub current: Option<Track>,

    /// Intended playing flag
    pub is_playing: bool,

    /// Elapsed position in seconds; not authoritative across reloads
    #[serde(default)]
    pub position_secs: f64,

    /// Duration of the loaded resource in seconds
    #[serde(default)]
    pub duration_secs: Option<f64>,

    /// Whether shuffle is enabled
    #[serde(default)]
    pub shuffle: bool,

    /// Repeat mode
    #[serde(default)]
    pub repeat: RepeatMode,

    /// Global library used for next/previous when no playlist is selected
    #[serde(default)]
    pub library: Vec<Track>,

    /// Last update timestamp (Unix epoch seconds)
    #[serde(default)]
    pub updated_at: i64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current: None,
            is_playing: false,
            position_secs: 0.0,
            duration_secs: None,
            shuffle: false,
            repeat: RepeatMode::Off,
            library: Vec::new(),
            updated_at: 0,
        }
    }
}
