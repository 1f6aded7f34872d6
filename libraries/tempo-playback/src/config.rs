//! Engine configuration
//!
//! Loaded from an optional `tempo.toml` and `TEMPO_`-prefixed environment
//! variables (nested keys use `__`, e.g. `TEMPO_STORAGE__QUOTA_BYTES`).

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempo_core::RepeatMode;
use tempo_storage::{FileStorage, MemoryStorage, ScopedStorage, SharedStore, StorePolicy};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    /// Catalog server root, e.g. `http://localhost:8080`
    #[serde(default = "default_server_url")]
    pub url: String,

    /// Path prefix audio files are served under
    #[serde(default = "default_stream_path")]
    pub stream_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Session directory; in-memory storage when unset
    #[serde(default)]
    pub session_dir: Option<PathBuf>,

    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: Option<usize>,

    #[serde(default = "default_compact_track_limit")]
    pub compact_track_limit: usize,

    #[serde(default = "default_transient_keys")]
    pub transient_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default)]
    pub shuffle: bool,

    #[serde(default)]
    pub repeat: RepeatMode,

    /// Minimum position change (seconds) before it is persisted
    #[serde(default = "default_position_granularity")]
    pub position_granularity_secs: f64,
}

impl EngineConfig {
    /// Load from `./tempo.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(Some(Path::new("tempo.toml")))
    }

    /// Load from an explicit file (if present) and the environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                settings = settings.add_source(config::File::from(path));
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("TEMPO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?.try_deserialize::<Self>()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.server.url).is_err() {
            return Err(PlaybackError::Config(format!(
                "invalid server url: {}",
                self.server.url
            )));
        }
        if !self.playback.position_granularity_secs.is_finite()
            || self.playback.position_granularity_secs <= 0.0
        {
            return Err(PlaybackError::Config(
                "position_granularity_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL catalog track paths are appended to
    pub fn stream_base_url(&self) -> String {
        let root = self.server.url.trim_end_matches('/');
        let prefix = self.server.stream_path.trim_matches('/');
        if prefix.is_empty() {
            root.to_string()
        } else {
            format!("{root}/{prefix}")
        }
    }

    /// Quota recovery policy for the shared store
    pub fn store_policy(&self) -> StorePolicy {
        StorePolicy {
            transient_keys: self.storage.transient_keys.clone(),
            compact_track_limit: self.storage.compact_track_limit,
        }
    }

    /// Open the session storage backend and wrap it in a shared store
    pub fn open_store(&self) -> Result<SharedStore> {
        let backend: Arc<dyn ScopedStorage> = match &self.storage.session_dir {
            Some(dir) => Arc::new(FileStorage::open(dir, self.storage.quota_bytes)?),
            None => match self.storage.quota_bytes {
                Some(quota) => Arc::new(MemoryStorage::with_quota(quota)),
                None => Arc::new(MemoryStorage::new()),
            },
        };
        Ok(SharedStore::with_bus(
            backend,
            tempo_storage::BroadcastBus::new(),
            self.store_policy(),
        ))
    }
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_stream_path() -> String {
    "/api/stream".to_string()
}

// Browser session storage allows about 5 MB
fn default_quota_bytes() -> Option<usize> {
    Some(5 * 1024 * 1024)
}

fn default_compact_track_limit() -> usize {
    500
}

fn default_transient_keys() -> Vec<String> {
    tempo_storage::keys::DEFAULT_TRANSIENT
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_position_granularity() -> f64 {
    1.0
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            stream_path: default_stream_path(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            session_dir: None,
            quota_bytes: default_quota_bytes(),
            compact_track_limit: default_compact_track_limit(),
            transient_keys: default_transient_keys(),
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat: RepeatMode::Off,
            position_granularity_secs: default_position_granularity(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            playback: PlaybackSettings::default(),
        }
    }
}
