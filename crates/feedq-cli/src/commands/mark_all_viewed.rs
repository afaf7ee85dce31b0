use anyhow::Result;

use feedq_core::storage::{Database, EntryRepository};

pub async fn run(db: &Database) -> Result<()> {
    let updated = EntryRepository::new(db).set_all_viewed().await?;
    println!("Marked {} entries as viewed.", updated);
    Ok(())
}
