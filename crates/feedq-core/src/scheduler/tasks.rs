use chrono::{Duration, Utc};

use crate::feed::FeedSource;
use crate::storage::{Database, EntryRepository};
use crate::{Error, Result};

/// Outcome of one fetch cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Entries written across all feeds
    pub upserted: u64,
    /// Feeds whose fetch or upsert failed this cycle
    pub failed_feeds: u32,
}

/// Fetch every feed in order and upsert its entries.
///
/// A failing feed is logged and skipped; the remaining feeds are still
/// processed. Nothing here is fatal to the caller.
pub async fn refresh_feeds(db: &Database, source: &dyn FeedSource, feeds: &[String]) -> RefreshReport {
    let entry_repo = EntryRepository::new(db);
    let mut report = RefreshReport::default();

    for url in feeds {
        tracing::debug!("Refreshing feed: {}", url);

        let entries = match source.fetch(url).await {
            Ok(entries) => entries,
            Err(e) if e.is_fetch_error() => {
                tracing::warn!("Failed to fetch feed '{}': {}", url, e);
                report.failed_feeds += 1;
                continue;
            }
            Err(e) => {
                tracing::error!("Unexpected error fetching feed '{}': {}", url, e);
                report.failed_feeds += 1;
                continue;
            }
        };

        match entry_repo.upsert_all(&entries).await {
            Ok(count) => {
                tracing::info!("Feed '{}': {} entries upserted", url, count);
                report.upserted += count;
            }
            Err(e) => {
                tracing::error!("Failed to store entries of feed '{}': {}", url, e);
                report.failed_feeds += 1;
            }
        }
    }

    report
}

/// Delete unsaved entries not fetched within the retention window
pub async fn cleanup_stale_entries(db: &Database, retention: Duration) -> Result<u64> {
    let threshold = Utc::now().checked_sub_signed(retention).ok_or_else(|| {
        Error::InvalidInput(format!(
            "Retention window of {} days reaches before the earliest representable time",
            retention.num_days()
        ))
    })?;
    let deleted = EntryRepository::new(db)
        .delete_stale_unsaved(threshold)
        .await?;

    if deleted > 0 {
        tracing::info!("Cleaned up {} stale entries (older than {})", deleted, threshold);
    }

    Ok(deleted)
}
