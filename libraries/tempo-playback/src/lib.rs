//! Tempo - Playback & Queue Engine
//!
//! Drives a single audio resource from a shared, persisted playback store.
//!
//! This crate provides:
//! - Track source resolution (catalog streams, local files, offline downloads)
//! - A persisted play-next queue with playlist restore after it drains
//! - The playback state machine (autoplay gate, stale attempt handling)
//! - Shuffle (random pick) and repeat modes (Off, All, One)
//! - The like/favorites bridge
//! - Presentation adapters rendering a [`NowPlayingView`]
//!
//! # Architecture
//!
//! The store is the single source of truth for *intended* state. Surfaces
//! only read it and call the engine; the engine reconciles the audio
//! resource with it after every `storage-changed` broadcast.
//!
//! Platform code (audio element, catalog, downloads) is provided via traits.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tempo_playback::{
//!     AudioResource, EngineConfig, EngineParts, LogNotices, PlayFailure, PlaybackEngine,
//!     ResourceEvent,
//! };
//! # use tempo_core::{CatalogService, PlatformCapabilities, Track, TrackId, TrackOrigin};
//! # struct Element;
//! # #[async_trait::async_trait]
//! # impl AudioResource for Element {
//! #     fn set_source(&self, _url: &str) {}
//! #     fn reload(&self) {}
//! #     async fn play(&self) -> Result<(), PlayFailure> { Ok(()) }
//! #     fn pause(&self) {}
//! #     fn seek(&self, _position_secs: f64) {}
//! # }
//! # struct Catalog;
//! # #[async_trait::async_trait]
//! # impl CatalogService for Catalog {
//! #     async fn liked_tracks(&self) -> tempo_core::Result<Vec<Track>> { Ok(vec![]) }
//! #     async fn like_track(&self, _id: &TrackId) -> tempo_core::Result<()> { Ok(()) }
//! #     async fn unlike_track(&self, _id: &TrackId) -> tempo_core::Result<()> { Ok(()) }
//! #     async fn record_recently_played(&self, _id: &TrackId) -> tempo_core::Result<()> { Ok(()) }
//! #     async fn playlist_tracks(&self, _id: &str) -> tempo_core::Result<Vec<Track>> { Ok(vec![]) }
//! # }
//! # struct Web;
//! # impl PlatformCapabilities for Web { fn has_offline_support(&self) -> bool { false } }
//! # async fn run() -> tempo_playback::Result<()> {
//! let config = EngineConfig::load()?;
//! let engine = PlaybackEngine::new(EngineParts {
//!     store: config.open_store()?,
//!     resource: Arc::new(Element),
//!     catalog: Arc::new(Catalog),
//!     offline: None,
//!     platform: Arc::new(Web),
//!     notices: Arc::new(LogNotices),
//!     config,
//! });
//! let _observer = engine.spawn_observer();
//! engine.restore().await;
//!
//! engine
//!     .play_track(Track::new("t1", "Intro", "Artist", TrackOrigin::catalog("a/01.mp3")))
//!     .await;
//! engine
//!     .handle_resource_event(ResourceEvent::MetadataLoaded { duration_secs: Some(180.0) })
//!     .await;
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod events;
mod likes;
mod notice;
mod queue;
mod resolver;
mod resource;
pub mod shuffle;
mod slot;
mod surfaces;
pub mod types;

// Public exports
pub use config::{EngineConfig, PlaybackSettings, ServerSettings, StorageSettings};
pub use engine::{EngineParts, PlaybackEngine, StoreObserver};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use likes::LikesBridge;
pub use notice::{LogNotices, Notice, NoticeBoard, NoticeSink};
pub use queue::PlayQueue;
pub use resolver::TrackSourceResolver;
pub use resource::AudioResource;
pub use slot::EngineSlot;
pub use surfaces::{NowPlayingView, PlayerSurface, SurfaceKind};
pub use types::{Interaction, PlayFailure, PlayerState, ResourceEvent};
