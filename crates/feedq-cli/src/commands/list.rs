use anyhow::Result;

use feedq_core::storage::{Database, EntryRepository};

pub async fn run(db: &Database, unviewed_only: bool) -> Result<()> {
    let entry_repo = EntryRepository::new(db);
    let entries: Vec<_> = entry_repo
        .get_all()
        .await?
        .into_iter()
        .filter(|e| !unviewed_only || !e.viewed)
        .collect();

    if entries.is_empty() {
        println!("No entries yet.");
        println!("\nTo fetch the configured feeds, run:");
        println!("  feedq refresh");
        return Ok(());
    }

    println!("Entries ({}):\n", entries.len());

    for entry in &entries {
        let mut flags = String::new();
        if entry.viewed {
            flags.push_str(" [viewed]");
        }
        if entry.saved {
            flags.push_str(" [saved]");
        }

        println!("  #{} {}{}", entry.id, entry.title, flags);
        println!("    URL: {}", entry.url);
        println!(
            "    Rank: {}  Last fetched: {}",
            entry.rank,
            entry.last_fetch.format("%Y-%m-%d %H:%M")
        );
        println!();
    }

    Ok(())
}
