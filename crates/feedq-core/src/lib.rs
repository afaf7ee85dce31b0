pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod scheduler;
pub mod storage;

pub use config::AppConfig;
pub use error::{Error, Result};
