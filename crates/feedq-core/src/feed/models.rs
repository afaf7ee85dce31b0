use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A feed item as decoded from the remote document, before persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub url: String,
    pub rank: i64,
    pub title: String,
}

impl RawEntry {
    pub fn new(url: impl Into<String>, rank: i64, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rank,
            title: title.into(),
        }
    }
}

/// A persisted feed item with its read-queue state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub id: i64,
    pub url: String,
    pub rank: i64,
    pub title: String,
    #[serde(skip)]
    pub last_fetch: DateTime<Utc>,
    pub viewed: bool,
    pub saved: bool,
}

/// Full replacement of the user-controlled flags of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFlags {
    pub viewed: bool,
    pub saved: bool,
}
