//! Catalog server client.

use crate::error::{Result, ServerClientError};
use crate::types::{ServerConfig, ServerInfo, ServerTrack, TracksResponse};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Duration;
use tempo_core::{CatalogService, Track, TrackId};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Client for a Tempo catalog server.
///
/// Implements [`CatalogService`] so the playback engine can like tracks,
/// record plays and fetch playlists.
///
/// # Example
///
/// ```ignore
/// use tempo_server_client::{CatalogClient, ServerConfig};
///
/// let client = CatalogClient::new(ServerConfig::with_token("https://music.example.com", "token"))?;
/// let info = client.test_connection().await?;
/// println!("Connected to {} v{}", info.name, info.version);
///
/// let liked = client.fetch_liked_tracks().await?;
/// println!("{} liked tracks", liked.len());
/// ```
pub struct CatalogClient {
    http: Client,
    config: Arc<RwLock<ServerConfig>>,
}

impl CatalogClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ServerClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let url = config.url.trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ServerClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        if url::Url::parse(&url).is_err() {
            return Err(ServerClientError::InvalidUrl(format!("cannot parse {url}")));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Tempo/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(RwLock::new(ServerConfig {
                url,
                access_token: config.access_token,
            })),
        })
    }

    /// Get the server URL.
    pub async fn url(&self) -> String {
        self.config.read().await.url.clone()
    }

    /// Check if the client has an access token.
    pub async fn is_authenticated(&self) -> bool {
        self.config.read().await.access_token.is_some()
    }

    /// Replace the access token (e.g., after re-login).
    pub async fn set_token(&self, access_token: Option<String>) {
        self.config.write().await.access_token = access_token;
    }

    /// Test the connection to the server.
    ///
    /// This does not require authentication.
    pub async fn test_connection(&self) -> Result<ServerInfo> {
        let url = format!("{}/api/info", self.url().await);
        debug!(url = %url, "Testing server connection");

        let response = self.send(self.http.get(&url)).await?;
        let info: ServerInfo = parse(response, "server info").await?;

        info!(
            name = %info.name,
            version = %info.version,
            features = ?info.features,
            "Connected to server"
        );
        Ok(info)
    }

    /// Tracks the current user has liked.
    pub async fn fetch_liked_tracks(&self) -> Result<Vec<Track>> {
        let response = self.authed(Method::GET, "/api/tracks/liked").await?;
        let body: TracksResponse = parse(response, "liked tracks").await?;
        debug!(tracks = body.tracks.len(), "Fetched liked tracks");
        Ok(body.tracks.into_iter().map(Track::from).collect())
    }

    /// Like (`true`) or unlike (`false`) a track.
    pub async fn set_liked(&self, id: &TrackId, liked: bool) -> Result<()> {
        let method = if liked { Method::POST } else { Method::DELETE };
        let path = format!("/api/tracks/{}/like", urlencoding::encode(id.as_str()));
        self.authed(method, &path).await?;
        debug!(track_id = %id, liked, "Updated like");
        Ok(())
    }

    /// Record that a track started playing.
    pub async fn record_played(&self, id: &TrackId) -> Result<()> {
        let path = format!("/api/tracks/{}/played", urlencoding::encode(id.as_str()));
        self.authed(Method::POST, &path).await?;
        Ok(())
    }

    /// Ordered tracks of a playlist.
    pub async fn fetch_playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        let path = format!("/api/playlists/{}/tracks", urlencoding::encode(playlist_id));
        let response = self.authed(Method::GET, &path).await?;
        let tracks: Vec<ServerTrack> = parse(response, "playlist tracks").await?;
        debug!(playlist_id, tracks = tracks.len(), "Fetched playlist");
        Ok(tracks.into_iter().map(Track::from).collect())
    }

    async fn authed(&self, method: Method, path: &str) -> Result<Response> {
        let config = self.config.read().await;
        let token = config
            .access_token
            .clone()
            .ok_or(ServerClientError::AuthRequired)?;
        let url = format!("{}{}", config.url, path);
        drop(config);

        debug!(%method, url = %url, "Catalog request");
        self.send(self.http.request(method, &url).bearer_auth(token))
            .await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ServerClientError::ServerUnreachable(e.to_string())
            } else {
                ServerClientError::Request(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status.as_u16() == 401 {
            Err(ServerClientError::AuthRequired)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }
}

async fn parse<T: serde::de::DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| ServerClientError::ParseError(format!("Failed to parse {what}: {e}")))
}

#[async_trait]
impl CatalogService for CatalogClient {
    async fn liked_tracks(&self) -> tempo_core::Result<Vec<Track>> {
        Ok(self.fetch_liked_tracks().await?)
    }

    async fn like_track(&self, id: &TrackId) -> tempo_core::Result<()> {
        Ok(self.set_liked(id, true).await?)
    }

    async fn unlike_track(&self, id: &TrackId) -> tempo_core::Result<()> {
        Ok(self.set_liked(id, false).await?)
    }

    async fn record_recently_played(&self, id: &TrackId) -> tempo_core::Result<()> {
        Ok(self.record_played(id).await?)
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> tempo_core::Result<Vec<Track>> {
        Ok(self.fetch_playlist_tracks(playlist_id).await?)
    }
}
