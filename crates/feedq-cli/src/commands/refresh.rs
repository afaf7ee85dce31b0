use anyhow::{bail, Result};

use feedq_core::{feed::FeedFetcher, scheduler::refresh_feeds, storage::Database, AppConfig};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    if config.sync.feeds.is_empty() {
        bail!("No feeds configured. Add URLs to [sync] feeds in {}", AppConfig::config_path().display());
    }

    println!("Refreshing {} feed(s)...\n", config.sync.feeds.len());

    let fetcher = FeedFetcher::new(&config.sync)?;
    let report = refresh_feeds(db, &fetcher, &config.sync.feeds).await;

    println!("\nRefresh complete. {} entries upserted.", report.upserted);
    if report.failed_feeds > 0 {
        println!("{} feed(s) failed, see the log for details.", report.failed_feeds);
    }

    Ok(())
}
