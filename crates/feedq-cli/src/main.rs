use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedq_core::{storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "feedq")]
#[command(author, version, about = "Scheduled feed reader queue with an HTTP API")]
struct Cli {
    /// Path to the configuration file (default: ~/.config/feedq/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fetch and retention schedulers with the HTTP API
    Serve,
    /// Fetch all configured feeds once
    Refresh,
    /// Delete stale unsaved entries once
    Cleanup,
    /// Print stored entries
    List {
        /// Only show entries not yet viewed
        #[arg(short, long)]
        unviewed: bool,
    },
    /// Mark every stored entry as viewed
    MarkAllViewed,
    /// Create or upgrade the database schema
    Migrate,
}

/// Checks that must pass before the database is opened
fn validate_for(command: &Commands, config: &AppConfig) -> feedq_core::Result<()> {
    match command {
        Commands::Serve => config.validate_for_serve(),
        _ => config.validate(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Reject bad settings before anything touches the data directory
    validate_for(&cli.command, &config)?;
    let config = Arc::new(config);

    let db = Arc::new(Database::new(&config).await?);

    let result = match cli.command {
        Commands::Serve => commands::serve::run(db.clone(), config).await,
        Commands::Refresh => commands::refresh::run(&db, &config).await,
        Commands::Cleanup => commands::cleanup::run(&db, &config).await,
        Commands::List { unviewed } => commands::list::run(&db, unviewed).await,
        Commands::MarkAllViewed => commands::mark_all_viewed::run(&db).await,
        Commands::Migrate => commands::migrate::run(&db, &config).await,
    };

    db.close().await;
    result
}
