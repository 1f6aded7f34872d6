//! Platform-agnostic audio resource trait
//!
//! Abstracts the one audio output element the engine owns (an HTML audio
//! element, a native media player, a decoder + output stream).

use crate::types::PlayFailure;
use async_trait::async_trait;

/// The single audio output resource
///
/// Implementors report readiness, progress, end and errors back to the engine
/// through [`crate::PlaybackEngine::handle_resource_event`].
#[async_trait]
pub trait AudioResource: Send + Sync {
    /// Assign a new source URL/URI
    ///
    /// Does not imply a reload; the engine always calls [`reload`](Self::reload)
    /// afterwards.
    fn set_source(&self, url: &str);

    /// Discard buffered data and start loading the current source
    fn reload(&self);

    /// Start playback
    ///
    /// Resolves once playback actually started or was refused.
    async fn play(&self) -> Result<(), PlayFailure>;

    /// Pause playback
    fn pause(&self);

    /// Move the playhead
    fn seek(&self, position_secs: f64);
}
