mod fetcher;
mod models;
mod parser;

pub use fetcher::{FeedFetcher, FeedSource};
pub use models::{Entry, EntryFlags, RawEntry};
pub use parser::parse_entries;
