mod service;
pub mod tasks;

pub use service::{
    FetchScheduler, RetentionScheduler, SchedulerEvent, SchedulerHandle, SchedulerService,
};
pub use tasks::{cleanup_stale_entries, refresh_feeds, RefreshReport};
