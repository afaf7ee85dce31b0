use anyhow::Result;

use feedq_core::{scheduler::cleanup_stale_entries, storage::Database, AppConfig};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    println!(
        "Cleaning up unsaved entries not fetched in the last {} days...",
        config.sync.retention_days
    );

    let deleted = cleanup_stale_entries(db, config.sync.retention_window()).await?;

    if deleted > 0 {
        println!("Deleted {} stale entries.", deleted);
    } else {
        println!("No entries to clean up.");
    }

    Ok(())
}
