//! Background task that keeps simulated readings changing.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::repository::InMemorySensorRepository;

/// Default period between simulated updates.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(2);

/// Drives [`InMemorySensorRepository::apply_random_update`] on a fixed period.
pub struct SensorSimulator {
    repository: Arc<InMemorySensorRepository>,
    interval: Duration,
}

impl SensorSimulator {
    pub fn new(repository: Arc<InMemorySensorRepository>) -> Self {
        Self {
            repository,
            interval: DEFAULT_UPDATE_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start the update loop. The first update is applied immediately.
    ///
    /// The task ends when `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        let Self {
            repository,
            interval,
        } = self;
        let interval = interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!(interval_ms = interval.as_millis() as u64, "Sensor simulator started");

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => repository.apply_random_update(),
                }
            }

            debug!(updates = repository.update_count(), "Sensor simulator stopped");
        })
    }
}
