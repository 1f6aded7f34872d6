//! Command implementations

use anyhow::Context as _;
use std::sync::Arc;
use tempo_core::{PlatformCapabilities, PlaybackState, PlaylistContext, Track, TrackId};
use tempo_playback::{EngineConfig, LikesBridge, PlayQueue, TrackSourceResolver};
use tempo_server_client::{CatalogClient, ServerConfig};
use tempo_storage::{keys, SharedStore};
use tracing::info;

/// Desktop terminal: always online, no download store
struct Terminal;

impl PlatformCapabilities for Terminal {
    fn has_offline_support(&self) -> bool {
        false
    }
}

pub struct Context {
    config: EngineConfig,
    store: SharedStore,
    catalog: Arc<CatalogClient>,
}

impl Context {
    pub fn new(config: EngineConfig, token: Option<String>) -> anyhow::Result<Self> {
        let server = match token {
            Some(token) => ServerConfig::with_token(&config.server.url, token),
            None => ServerConfig::new(&config.server.url),
        };
        let catalog = Arc::new(CatalogClient::new(server).context("invalid catalog server")?);
        let store = config.open_store().context("failed to open session storage")?;

        Ok(Self {
            config,
            store,
            catalog,
        })
    }

    fn resolver(&self) -> TrackSourceResolver {
        TrackSourceResolver::new(self.config.stream_base_url(), None, Arc::new(Terminal))
    }

    fn likes(&self) -> LikesBridge {
        LikesBridge::new(
            self.store.clone(),
            self.catalog.clone(),
            None,
            Arc::new(Terminal),
        )
    }
}

pub async fn info(context: &Context) -> anyhow::Result<()> {
    let info = context.catalog.test_connection().await?;
    println!("{} v{}", info.name, info.version);
    if !info.features.is_empty() {
        println!("features: {}", info.features.join(", "));
    }
    Ok(())
}

pub async fn liked(context: &Context) -> anyhow::Result<()> {
    let liked = context.likes().liked_songs_context().await?;
    print_tracks(&liked.tracks);
    Ok(())
}

pub async fn toggle_like(context: &Context, track_id: &str) -> anyhow::Result<()> {
    let id = TrackId::new(track_id);
    let liked = context.likes().toggle(&id).await?;
    info!(track_id, liked, "Like updated");
    println!("{track_id}: {}", if liked { "liked" } else { "not liked" });
    Ok(())
}

pub async fn playlist(context: &Context, id: &str) -> anyhow::Result<()> {
    let tracks = context.catalog.fetch_playlist_tracks(id).await?;
    let resolver = context.resolver();

    for (index, track) in tracks.iter().enumerate() {
        let url = match resolver.resolve(track).await {
            Ok(url) => url,
            Err(e) => format!("<{e}>"),
        };
        println!("{:>3}. {} - {}\n     {url}", index + 1, track.artist, track.title);
    }
    Ok(())
}

pub fn state(context: &Context) {
    let state: PlaybackState = context.store.read_or_default(keys::PLAYBACK_STATE);
    let selected: Option<PlaylistContext> = context.store.read(keys::SELECTED_PLAYLIST, None);

    match &state.current {
        Some(track) => println!(
            "{} {} - {} [{:.0}s]",
            if state.is_playing { "playing" } else { "paused" },
            track.artist,
            track.title,
            state.position_secs
        ),
        None => println!("idle"),
    }
    println!("shuffle: {}  repeat: {}", state.shuffle, state.repeat);
    println!(
        "context: {}",
        selected.map_or_else(|| format!("library ({} tracks)", state.library.len()), |c| c.name)
    );
}

pub fn queue(context: &Context) {
    let queue = PlayQueue::new(context.store.clone());
    let tracks = queue.tracks();
    if tracks.is_empty() {
        println!("queue is empty");
    } else {
        print_tracks(&tracks);
    }
    if queue.has_restore_marker() {
        println!("(playlist restore pending)");
    }
}

pub fn clear_session(context: &Context) {
    context.store.clear();
    info!("Session cleared");
}

fn print_tracks(tracks: &[Track]) {
    for (index, track) in tracks.iter().enumerate() {
        println!("{:>3}. {} - {}", index + 1, track.artist, track.title);
    }
}
