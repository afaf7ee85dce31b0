use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::Database;
use crate::feed::{Entry, EntryFlags, RawEntry};
use crate::{Error, Result};

/// Repository for entry persistence and read-queue state
pub struct EntryRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct EntryRow {
    id: i64,
    url: String,
    rank: i64,
    title: String,
    last_fetch: DateTime<Utc>,
    viewed: i32,
    saved: i32,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        Entry {
            id: row.id,
            url: row.url,
            rank: row.rank,
            title: row.title,
            last_fetch: row.last_fetch,
            viewed: row.viewed != 0,
            saved: row.saved != 0,
        }
    }
}

// viewed/saved stay out of the conflict branch: a re-fetch never resets user state.
const UPSERT_ENTRY: &str = r#"
INSERT INTO entries (url, rank, title, last_fetch)
VALUES (?, ?, ?, ?)
ON CONFLICT (url) DO UPDATE
SET rank = excluded.rank,
    title = excluded.title,
    last_fetch = excluded.last_fetch
"#;

impl<'a> EntryRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert new entries and refresh known ones, keyed by url.
    /// Returns the number of entries written.
    pub async fn upsert_all(&self, entries: &[RawEntry]) -> Result<u64> {
        self.upsert_all_at(entries, Utc::now()).await
    }

    /// Same as [`upsert_all`](Self::upsert_all) with an explicit fetch time.
    /// The batch commits or rolls back as a whole.
    pub async fn upsert_all_at(&self, entries: &[RawEntry], fetched_at: DateTime<Utc>) -> Result<u64> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.pool().begin().await?;

        for entry in entries {
            if let Err(e) = sqlx::query(UPSERT_ENTRY)
                .bind(&entry.url)
                .bind(entry.rank)
                .bind(&entry.title)
                .bind(fetched_at)
                .execute(&mut *tx)
                .await
            {
                tracing::error!(url = %entry.url, error = %e, "Failed to upsert entry");
                return Err(e.into());
            }
        }

        tx.commit().await?;

        Ok(entries.len() as u64)
    }

    /// Get every entry, ordered by id
    pub async fn get_all(&self) -> Result<Vec<Entry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            r#"
            SELECT id, url, rank, title, last_fetch, viewed, saved
            FROM entries
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Entry::from).collect())
    }

    /// Find an entry by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Entry>> {
        let row: Option<EntryRow> = sqlx::query_as(
            r#"
            SELECT id, url, rank, title, last_fetch, viewed, saved
            FROM entries
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Entry::from))
    }

    /// Number of entries not yet viewed
    pub async fn get_queue_count(&self) -> Result<u64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entries WHERE viewed = 0")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u64)
    }

    /// Oldest (smallest id) entry not yet viewed
    pub async fn get_next_unviewed(&self) -> Result<Option<Entry>> {
        let row: Option<EntryRow> = sqlx::query_as(
            r#"
            SELECT id, url, rank, title, last_fetch, viewed, saved
            FROM entries
            WHERE viewed = 0
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Entry::from))
    }

    /// Replace both user flags of an entry
    pub async fn update(&self, id: i64, flags: EntryFlags) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE entries
            SET viewed = ?, saved = ?
            WHERE id = ?
            "#,
        )
        .bind(flags.viewed)
        .bind(flags.saved)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::EntryNotFound(id));
        }

        Ok(())
    }

    /// Delete unsaved entries whose last fetch predates `threshold`
    pub async fn delete_stale_unsaved(&self, threshold: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM entries
            WHERE last_fetch < ? AND saved = 0
            "#,
        )
        .bind(threshold)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// Mark every unviewed entry as viewed
    pub async fn set_all_viewed(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE entries SET viewed = 1 WHERE viewed = 0")
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
