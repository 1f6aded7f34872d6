//! Playback Events
//!
//! Emitted for platform integration (media session, OS now-playing widgets,
//! logging). UI surfaces do not need these; they render from the shared store.

use crate::types::PlayerState;
use serde::{Deserialize, Serialize};
use tempo_core::TrackId;

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Resource state changed
    StateChanged {
        /// The new state
        state: PlayerState,
    },

    /// A new source was loaded into the resource
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previously loaded track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Queue changed (tracks added or consumed)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Error occurred during playback
    Error {
        /// Error message
        message: String,
    },
}
