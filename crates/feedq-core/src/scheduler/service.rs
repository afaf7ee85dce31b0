use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::feed::FeedSource;
use crate::storage::Database;
use crate::Result;

use super::tasks::{cleanup_stale_entries, refresh_feeds, RefreshReport};

/// Events emitted by the schedulers after each tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// A fetch cycle finished
    FeedsRefreshed { upserted: u64, failed_feeds: u32 },
    /// A retention sweep finished
    EntriesCleaned { deleted: u64 },
    /// A background task failed; the schedule continues
    Error { task: String, message: String },
}

type EventSender = mpsc::UnboundedSender<SchedulerEvent>;

fn send_event(event_tx: &Option<EventSender>, event: SchedulerEvent) {
    if let Some(tx) = event_tx {
        if tx.send(event).is_err() {
            warn!("Failed to send scheduler event: receiver dropped");
        }
    }
}

/// Wait for the next shutdown change. A dropped sender counts as shutdown.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) -> bool {
    match shutdown.changed().await {
        Ok(()) => *shutdown.borrow(),
        Err(_) => true,
    }
}

/// Periodic fetch-and-upsert job.
///
/// At most one fetch cycle runs at a time: the tick loop awaits each cycle
/// before polling its timer again, and `refresh_now` shares the same cycle
/// guard, skipping instead of overlapping.
#[derive(Clone)]
pub struct FetchScheduler {
    db: Arc<Database>,
    source: Arc<dyn FeedSource>,
    feeds: Arc<Vec<String>>,
    period: Duration,
    cycle_guard: Arc<Mutex<()>>,
    event_tx: Option<EventSender>,
}

impl FetchScheduler {
    pub fn new(
        db: Arc<Database>,
        source: Arc<dyn FeedSource>,
        feeds: Vec<String>,
        period: Duration,
    ) -> Self {
        Self {
            db,
            source,
            feeds: Arc::new(feeds),
            period,
            cycle_guard: Arc::new(Mutex::new(())),
            event_tx: None,
        }
    }

    pub fn from_config(db: Arc<Database>, source: Arc<dyn FeedSource>, config: &SyncConfig) -> Self {
        Self::new(db, source, config.feeds.clone(), config.fetch_interval())
    }

    /// Set the event sender for tick notifications
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Tick every period, starting immediately, until shutdown
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Fetch scheduler started: every {}s, {} feed(s)",
            self.period.as_secs(),
            self.feeds.len()
        );

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                stop = shutdown_requested(&mut shutdown) => {
                    if stop {
                        info!("Fetch scheduler received shutdown signal");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        info!("Fetch scheduler stopped");
    }

    /// Run one fetch cycle now. Returns `None` when a cycle is already in flight.
    pub async fn refresh_now(&self) -> Option<RefreshReport> {
        self.run_cycle().await
    }

    async fn run_cycle(&self) -> Option<RefreshReport> {
        let Ok(_guard) = self.cycle_guard.try_lock() else {
            warn!("Fetch cycle already running, skipping");
            return None;
        };

        debug!("Running fetch cycle");
        let report = refresh_feeds(&self.db, self.source.as_ref(), &self.feeds).await;

        if report.failed_feeds > 0 {
            warn!(
                "Fetch cycle done: {} entries upserted, {} feed(s) failed",
                report.upserted, report.failed_feeds
            );
        } else {
            info!("Fetch cycle done: {} entries upserted", report.upserted);
        }

        send_event(
            &self.event_tx,
            SchedulerEvent::FeedsRefreshed {
                upserted: report.upserted,
                failed_feeds: report.failed_feeds,
            },
        );

        Some(report)
    }
}

/// Periodic retention sweep, first run delayed so it does not race the
/// initial fetch cycle.
pub struct RetentionScheduler {
    db: Arc<Database>,
    period: Duration,
    start_delay: Duration,
    retention: chrono::Duration,
    event_tx: Option<EventSender>,
}

impl RetentionScheduler {
    pub fn new(
        db: Arc<Database>,
        period: Duration,
        start_delay: Duration,
        retention: chrono::Duration,
    ) -> Self {
        Self {
            db,
            period,
            start_delay,
            retention,
            event_tx: None,
        }
    }

    pub fn from_config(db: Arc<Database>, config: &SyncConfig) -> Self {
        Self::new(
            db,
            config.cleanup_interval(),
            config.cleanup_start_delay(),
            config.retention_window(),
        )
    }

    /// Set the event sender for tick notifications
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Retention scheduler started: every {}s after {}s, retention {} day(s)",
            self.period.as_secs(),
            self.start_delay.as_secs(),
            self.retention.num_days()
        );

        let mut ticker = interval_at(Instant::now() + self.start_delay, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                stop = shutdown_requested(&mut shutdown) => {
                    if stop {
                        info!("Retention scheduler received shutdown signal");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    debug!("Running retention sweep");
                    match self.sweep_now().await {
                        Ok(deleted) => {
                            send_event(&self.event_tx, SchedulerEvent::EntriesCleaned { deleted });
                        }
                        Err(e) => {
                            error!("Retention sweep failed: {}", e);
                            send_event(&self.event_tx, SchedulerEvent::Error {
                                task: "cleanup".to_string(),
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        info!("Retention scheduler stopped");
    }

    /// Run one sweep now
    pub async fn sweep_now(&self) -> Result<u64> {
        cleanup_stale_entries(&self.db, self.retention).await
    }
}

/// Owns both background jobs for the lifetime of the process
pub struct SchedulerService {
    fetch: FetchScheduler,
    retention: RetentionScheduler,
}

/// Join handles of the spawned scheduler tasks
pub struct SchedulerHandle {
    handles: Vec<JoinHandle<()>>,
}

impl SchedulerService {
    pub fn new(db: Arc<Database>, source: Arc<dyn FeedSource>, config: &SyncConfig) -> Self {
        Self {
            fetch: FetchScheduler::from_config(db.clone(), source, config),
            retention: RetentionScheduler::from_config(db, config),
        }
    }

    /// Set the event sender for both schedulers
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.fetch = self.fetch.with_event_sender(tx.clone());
        self.retention = self.retention.with_event_sender(tx);
        self
    }

    /// Spawn both schedulers as independent tasks
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> SchedulerHandle {
        let fetch = tokio::spawn(self.fetch.run(shutdown.clone()));
        let retention = tokio::spawn(self.retention.run(shutdown));
        SchedulerHandle {
            handles: vec![fetch, retention],
        }
    }
}

impl SchedulerHandle {
    /// Wait for every scheduler task to finish
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Scheduler task panicked: {}", e);
            }
        }
    }
}
