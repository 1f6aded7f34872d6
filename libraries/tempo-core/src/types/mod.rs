mod ids;
mod playback_state;
mod playlist;
mod track;

pub use ids::TrackId;
pub use playback_state::{PlaybackState, RepeatMode};
pub use playlist::{PlaylistContext, RestoreMarker, LIKED_SONGS_PLAYLIST_ID};
pub use track::{Track, TrackOrigin};
