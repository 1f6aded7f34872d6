//! Well-known store keys

/// `PlaybackState` record
pub const PLAYBACK_STATE: &str = "playback_state";

/// Pending play queue (`Vec<Track>`)
pub const PLAY_QUEUE: &str = "play_queue";

/// Selected playlist context (`Option<PlaylistContext>`)
pub const SELECTED_PLAYLIST: &str = "selected_playlist";

/// One-shot playlist restore marker (`RestoreMarker`)
pub const PLAYLIST_RESTORE: &str = "playlist_restore";

/// Mirror of the liked track id set (`Vec<TrackId>`)
pub const LIKED_TRACK_IDS: &str = "liked_track_ids";

/// Keys that may be evicted to make room when the quota is hit
pub const DEFAULT_TRANSIENT: &[&str] = &[PLAY_QUEUE];
