//! Shared state handed to every route handler.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::storage::Database;

/// Application state for the HTTP API.
///
/// Cloned per request; the database pool is shared behind an `Arc`.
#[derive(Clone)]
pub struct ApiState {
    /// Entry store.
    pub database: Arc<Database>,
    /// Basic auth username.
    pub username: Arc<str>,
    /// Basic auth password.
    pub password: Arc<str>,
}

impl ApiState {
    pub fn new(database: Arc<Database>, username: &str, password: &str) -> Self {
        Self {
            database,
            username: Arc::from(username),
            password: Arc::from(password),
        }
    }

    pub fn from_config(database: Arc<Database>, config: &ServerConfig) -> Self {
        Self::new(database, &config.username, &config.password)
    }
}
