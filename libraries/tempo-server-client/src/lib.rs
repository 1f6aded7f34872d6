//! Tempo Catalog Client
//!
//! HTTP client for the Tempo catalog server, implementing
//! [`tempo_core::CatalogService`].
//!
//! # Features
//!
//! - **Likes**: fetch liked tracks, like and unlike
//! - **Playlists**: fetch a playlist's ordered tracks
//! - **Play history**: record recently played tracks
//!
//! # Example
//!
//! ```ignore
//! use tempo_server_client::{CatalogClient, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CatalogClient::new(ServerConfig::with_token("https://music.example.com", "token"))?;
//!
//!     let info = client.test_connection().await?;
//!     println!("Connected to {} v{}", info.name, info.version);
//!
//!     for track in client.fetch_playlist_tracks("road-trip").await? {
//!         println!("{} - {}", track.artist, track.title);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::CatalogClient;
pub use error::{Result, ServerClientError};
pub use types::{ServerConfig, ServerInfo, ServerTrack, TracksResponse};
