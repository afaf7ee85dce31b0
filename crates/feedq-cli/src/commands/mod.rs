pub mod cleanup;
pub mod list;
pub mod mark_all_viewed;
pub mod migrate;
pub mod refresh;
pub mod serve;
