//! Reduced projections for persisting under quota pressure
//!
//! When a value does not fit, the store writes `value.compact(limit)` instead:
//! non-essential fields stripped and track lists capped at `limit` entries.
//! The result must still deserialize as the same type.

use tempo_core::types::{PlaybackState, PlaylistContext, RestoreMarker, Track, TrackId};

/// A value that can produce a smaller, still-valid version of itself
pub trait Compact: Sized {
    /// Reduced projection, or `None` if the value cannot shrink
    fn compact(&self, limit: usize) -> Option<Self> {
        let _ = limit;
        None
    }
}

fn compact_track(track: &Track, limit: usize) -> Track {
    Track {
        id: track.id.clone(),
        title: track.title.clone(),
        artist: track.artist.clone(),
        album: None,
        origin: track.origin.clone(),
        duration_secs: track.duration_secs,
        artwork: None,
        from_playlist: track
            .from_playlist
            .as_ref()
            .map(|context| compact_context(context, limit)),
    }
}

fn compact_tracks(tracks: &[Track], limit: usize) -> Vec<Track> {
    tracks
        .iter()
        .take(limit)
        .map(|t| {
            // Nested contexts inside a context's own tracks are never needed
            let mut t = compact_track(t, limit);
            t.from_playlist = None;
            t
        })
        .collect()
}

fn compact_context(context: &PlaylistContext, limit: usize) -> PlaylistContext {
    PlaylistContext {
        id: context.id.clone(),
        name: context.name.clone(),
        tracks: compact_tracks(&context.tracks, limit),
    }
}

impl Compact for Track {
    fn compact(&self, limit: usize) -> Option<Self> {
        Some(compact_track(self, limit))
    }
}

impl Compact for PlaylistContext {
    fn compact(&self, limit: usize) -> Option<Self> {
        Some(compact_context(self, limit))
    }
}

impl Compact for RestoreMarker {
    fn compact(&self, limit: usize) -> Option<Self> {
        Some(Self {
            context: compact_context(&self.context, limit),
            created_at: self.created_at,
        })
    }
}

impl Compact for PlaybackState {
    fn compact(&self, limit: usize) -> Option<Self> {
        Some(Self {
            current: self.current.as_ref().map(|t| compact_track(t, limit)),
            library: compact_tracks(&self.library, limit),
            ..self.clone()
        })
    }
}

impl Compact for Vec<Track> {
    fn compact(&self, limit: usize) -> Option<Self> {
        Some(
            self.iter()
                .take(limit)
                .map(|t| compact_track(t, limit))
                .collect(),
        )
    }
}

impl<T: Compact> Compact for Option<T> {
    fn compact(&self, limit: usize) -> Option<Self> {
        match self {
            Some(value) => value.compact(limit).map(Some),
            None => None,
        }
    }
}

impl Compact for Vec<TrackId> {}
impl Compact for bool {}
impl Compact for String {}
impl Compact for f64 {}
