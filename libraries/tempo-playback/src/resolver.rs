//! Track source resolution
//!
//! Turns a [`Track`] into the URL/URI handed to the audio resource. Nothing is
//! cached: the base URL may change between calls (server switch, re-login).

use crate::error::{PlaybackError, Result};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tempo_core::{OfflineStore, PlatformCapabilities, Track, TrackOrigin};
use tracing::debug;

/// Resolves tracks to playable URLs/URIs
#[derive(Clone)]
pub struct TrackSourceResolver {
    base_url: Arc<RwLock<String>>,
    offline: Option<Arc<dyn OfflineStore>>,
    platform: Arc<dyn PlatformCapabilities>,
}

impl TrackSourceResolver {
    pub fn new(
        base_url: impl Into<String>,
        offline: Option<Arc<dyn OfflineStore>>,
        platform: Arc<dyn PlatformCapabilities>,
    ) -> Self {
        Self {
            base_url: Arc::new(RwLock::new(base_url.into())),
            offline,
            platform,
        }
    }

    /// Current catalog base URL
    pub fn base_url(&self) -> String {
        self.base_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Point catalog resolution at a different server
    pub fn set_base_url(&self, url: impl Into<String>) {
        *self.base_url.write().unwrap_or_else(PoisonError::into_inner) = url.into();
    }

    /// Produce the URL/URI for a track
    pub async fn resolve(&self, track: &Track) -> Result<String> {
        match &track.origin {
            TrackOrigin::Catalog { path } => {
                // A downloaded copy wins when the catalog is unreachable
                if self.platform.has_offline_support() && !self.platform.is_online() {
                    if let Some(uri) = self.offline_uri(track).await {
                        debug!(track_id = %track.id, "Using offline copy of catalog track");
                        return Ok(uri);
                    }
                }
                self.catalog_url(track, path)
            }
            TrackOrigin::Local { path } => local_uri(track, path),
            TrackOrigin::Offline => {
                if !self.platform.has_offline_support() {
                    return Err(PlaybackError::resolution(
                        &track.id,
                        "offline playback is not supported on this platform",
                    ));
                }
                self.offline_uri(track).await.ok_or_else(|| {
                    PlaybackError::resolution(&track.id, "offline file is missing")
                })
            }
        }
    }

    async fn offline_uri(&self, track: &Track) -> Option<String> {
        let offline = self.offline.as_ref()?;
        if !offline.is_track_offline(&track.id).await {
            return None;
        }
        offline.offline_track_uri(&track.id).await
    }

    fn catalog_url(&self, track: &Track, path: &str) -> Result<String> {
        let base = self.base_url();
        let base = base.trim_end_matches('/');
        if base.is_empty() {
            return Err(PlaybackError::resolution(&track.id, "no catalog base url"));
        }

        // Library paths may come from a Windows host
        let normalized = path.replace('\\', "/");
        let segments: Vec<String> = normalized
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        if segments.is_empty() {
            return Err(PlaybackError::resolution(&track.id, "empty catalog path"));
        }

        Ok(format!("{base}/{}", segments.join("/")))
    }
}

fn local_uri(track: &Track, path: &str) -> Result<String> {
    url::Url::from_file_path(Path::new(path))
        .map(String::from)
        .map_err(|()| PlaybackError::resolution(&track.id, format!("not an absolute path: {path}")))
}

impl std::fmt::Debug for TrackSourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackSourceResolver")
            .field("base_url", &self.base_url())
            .field("offline", &self.offline.is_some())
            .finish_non_exhaustive()
    }
}
