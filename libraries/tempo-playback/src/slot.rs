//! Engine installation slot
//!
//! UI code outside the player tree (track lists, context menus) enqueues
//! through this slot. Until the engine is installed, enqueue fails with a
//! recoverable error and a notice instead of panicking.

use crate::engine::PlaybackEngine;
use crate::error::{PlaybackError, Result};
use crate::notice::{Notice, NoticeSink};
use std::sync::{Arc, PoisonError, RwLock};
use tempo_core::Track;
use tracing::{debug, warn};

#[derive(Clone, Default)]
pub struct EngineSlot {
    engine: Arc<RwLock<Option<Arc<PlaybackEngine>>>>,
}

impl EngineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, engine: Arc<PlaybackEngine>) {
        debug!("Engine installed");
        *self.engine.write().unwrap_or_else(PoisonError::into_inner) = Some(engine);
    }

    /// Remove the engine, returning it if one was installed
    pub fn teardown(&self) -> Option<Arc<PlaybackEngine>> {
        debug!("Engine torn down");
        self.engine
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn get(&self) -> Result<Arc<PlaybackEngine>> {
        self.engine
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(PlaybackError::QueueSystemUnavailable)
    }

    pub fn is_installed(&self) -> bool {
        self.engine
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Enqueue through the installed engine, posting a notice either way
    pub fn add_to_queue(&self, track: Track, notices: &dyn NoticeSink) -> Result<usize> {
        match self.get() {
            Ok(engine) => {
                let title = track.title.clone();
                let length = engine.add_to_queue(track);
                notices.post(Notice::AddedToQueue { title });
                Ok(length)
            }
            Err(e) => {
                warn!(track_id = %track.id, "Enqueue before engine install");
                notices.post(Notice::QueueUnavailable);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for EngineSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSlot")
            .field("installed", &self.is_installed())
            .finish()
    }
}
