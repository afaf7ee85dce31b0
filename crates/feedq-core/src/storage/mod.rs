mod database;
mod entry_repo;

pub use database::Database;
pub use entry_repo::EntryRepository;
