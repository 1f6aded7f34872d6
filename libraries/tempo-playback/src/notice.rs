//! Transient user-visible notices
//!
//! Recoverable failures (track unavailable, queue not ready) are reported to
//! the user as short-lived messages rather than errors.

use std::sync::{Mutex, PoisonError};
use tempo_core::TrackId;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Enqueue attempted before the engine is installed
    QueueUnavailable,

    /// A track was added to the play-next queue
    AddedToQueue { title: String },

    /// A track could not be resolved or loaded
    TrackUnavailable { title: String, reason: String },

    /// Like/unlike could not be saved
    LikeFailed { track_id: TrackId },

    /// The play-next queue was dropped to free storage
    QueueDropped,
}

impl Notice {
    /// Text shown to the user
    pub fn message(&self) -> String {
        match self {
            Self::QueueUnavailable => "Queue is not ready yet, try again in a moment".to_string(),
            Self::AddedToQueue { title } => format!("Added \"{title}\" to queue"),
            Self::TrackUnavailable { title, .. } => format!("\"{title}\" can't be played right now"),
            Self::LikeFailed { .. } => "Couldn't update your liked songs".to_string(),
            Self::QueueDropped => "Your queue was cleared to free up storage".to_string(),
        }
    }
}

/// Receiver of transient notices (toast area, status line)
pub trait NoticeSink: Send + Sync {
    fn post(&self, notice: Notice);
}

/// Sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotices;

impl NoticeSink for LogNotices {
    fn post(&self, notice: Notice) {
        info!(notice = %notice.message(), "Notice");
    }
}

/// Sink that collects notices until drained
#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending notice
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl NoticeSink for NoticeBoard {
    fn post(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
