//! Route handlers for the read-queue API.

use axum::extract::{Path, State};
use axum::http::Uri;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::feed::{Entry, EntryFlags};
use crate::storage::EntryRepository;

use super::error::ApiError;
use super::state::ApiState;

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn ok() -> Self {
        Self {
            status: "OK".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueueCountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkViewedResponse {
    pub updated: u64,
}

/// Parse the `{id}` path segment; anything that is not an i64 is rejected
/// before the store is touched.
fn parse_entry_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid entry id: {}", raw)))
}

/// GET /rss
pub async fn list_entries(State(state): State<ApiState>) -> Result<Json<Vec<Entry>>, ApiError> {
    let entries = EntryRepository::new(&state.database).get_all().await?;
    Ok(Json(entries))
}

/// PUT /rss/{id}
pub async fn update_entry(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(flags): Json<EntryFlags>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = parse_entry_id(&id)?;
    EntryRepository::new(&state.database).update(id, flags).await?;
    tracing::debug!(id, viewed = flags.viewed, saved = flags.saved, "Entry updated");
    Ok(Json(StatusResponse::ok()))
}

/// PUT on `/rss/queue` or `/rss/viewed`: those segments shadow `{id}` but are
/// not entry ids either
pub async fn reject_reserved_id(uri: Uri) -> ApiError {
    let segment = uri.path().rsplit('/').next().unwrap_or_default();
    ApiError::BadRequest(format!("Invalid entry id: {}", segment))
}

/// GET /rss/queue
pub async fn queue_count(
    State(state): State<ApiState>,
) -> Result<Json<QueueCountResponse>, ApiError> {
    let count = EntryRepository::new(&state.database).get_queue_count().await?;
    Ok(Json(QueueCountResponse { count }))
}

/// GET /rss/queue/next
pub async fn next_unviewed(State(state): State<ApiState>) -> Result<Json<Entry>, ApiError> {
    EntryRepository::new(&state.database)
        .get_next_unviewed()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Queue is empty".to_string()))
}

/// POST /rss/viewed
pub async fn mark_all_viewed(
    State(state): State<ApiState>,
) -> Result<Json<MarkViewedResponse>, ApiError> {
    let updated = EntryRepository::new(&state.database).set_all_viewed().await?;
    Ok(Json(MarkViewedResponse { updated }))
}

/// POST /checkauth, reached only with valid credentials
pub async fn check_auth() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}
