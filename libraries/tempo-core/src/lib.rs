//! Tempo Core
//!
//! Platform-agnostic domain types, collaborator traits, and error handling for
//! the Tempo player.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `PlaylistContext`, `PlaybackState`, `RestoreMarker`
//! - **Collaborator Traits**: `CatalogService`, `OfflineStore`, `PlatformCapabilities`
//! - **Error Handling**: Unified `TempoError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use tempo_core::types::{PlaylistContext, Track, TrackOrigin};
//!
//! let track = Track::new("t1", "Intro", "Some Artist", TrackOrigin::catalog("albums/a/01.flac"));
//! let context = PlaylistContext::new("p1", "Morning", vec![track.clone()]);
//!
//! assert_eq!(context.first().map(|t| t.id.as_str()), Some("t1"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Result, TempoError};
pub use traits::{CatalogService, OfflineStore, PlatformCapabilities};
pub use types::{
    PlaybackState, PlaylistContext, RepeatMode, RestoreMarker, Track, TrackId, TrackOrigin,
    LIKED_SONGS_PLAYLIST_ID,
};
