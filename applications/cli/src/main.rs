/// Tempo - command-line front end
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tempo_playback::EngineConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "tempo")]
#[command(about = "Tempo player command line", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Catalog access token
    #[arg(long, env = "TEMPO_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show catalog server information
    Info,
    /// List liked tracks
    Liked,
    /// Toggle the liked flag of a track
    Like {
        /// Track id
        track_id: String,
    },
    /// List a playlist's tracks with their stream URLs
    Playlist {
        /// Playlist id
        id: String,
    },
    /// Show the persisted playback state
    State,
    /// Show the play-next queue
    Queue,
    /// Wipe the persisted session
    ClearSession,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tempo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(Some(path.as_path()))?,
        None => EngineConfig::load()?,
    };
    let context = commands::Context::new(config, cli.token)?;

    match cli.command {
        Commands::Info => commands::info(&context).await?,
        Commands::Liked => commands::liked(&context).await?,
        Commands::Like { track_id } => commands::toggle_like(&context, &track_id).await?,
        Commands::Playlist { id } => commands::playlist(&context, &id).await?,
        Commands::State => commands::state(&context),
        Commands::Queue => commands::queue(&context),
        Commands::ClearSession => commands::clear_session(&context),
    }

    Ok(())
}
