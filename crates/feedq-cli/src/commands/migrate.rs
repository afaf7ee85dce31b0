use anyhow::Result;

use feedq_core::{storage::Database, AppConfig};

/// Schema setup happens on connect; this re-runs it explicitly and reports
/// where the store lives.
pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    db.run_migrations().await?;
    println!("Database is up to date: {}", config.database_url());
    Ok(())
}
