use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use feedq_core::{
    api::{create_router, start_server, ApiState},
    feed::FeedFetcher,
    scheduler::SchedulerService,
    storage::Database,
    AppConfig,
};

/// Run both schedulers and the API until Ctrl+C. Expects a config that
/// already passed `validate_for_serve`.
///
/// Shutdown order: the server drains in-flight requests, the scheduler tasks
/// finish their current tick and are joined. The caller closes the database.
pub async fn run(db: Arc<Database>, config: Arc<AppConfig>) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx_clone.send(true);
    });

    let fetcher = Arc::new(FeedFetcher::new(&config.sync)?);
    let schedulers = SchedulerService::new(db.clone(), fetcher, &config.sync).spawn(shutdown_rx.clone());

    println!("feedq serving on port {}. Press Ctrl+C to stop.", config.server.port);
    println!("  Feeds: {}", config.sync.feeds.len());
    println!("  Fetch interval: {} seconds", config.sync.fetch_interval_secs);
    println!("  Cleanup interval: {} hours", config.sync.cleanup_interval_hours);
    println!("  Retention: {} days", config.sync.retention_days);

    let router = create_router(
        ApiState::from_config(db, &config.server),
        &config.server.cors_allow_origins,
    );
    let served = start_server(config.server.port, router, shutdown_rx).await;

    // Stop the schedulers too if the server exited on its own
    let _ = shutdown_tx.send(true);
    schedulers.join().await;

    served?;
    println!("feedq stopped.");
    Ok(())
}
