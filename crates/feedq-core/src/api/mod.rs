//! Authenticated HTTP API over the entry store.

pub mod auth;
pub mod error;
pub mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::{create_router, serve, start_server};
pub use state::ApiState;
