//! Background task that forgets users who stopped interacting.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use log::info;

use crate::clock;
use crate::clock::Clock;
use crate::config::Config;
use crate::store::UserId;
use crate::store::UserRecords;
use crate::task::PeriodicTask;

pub struct RetentionSweeper {
    records: Arc<UserRecords>,
    clock: Arc<dyn Clock>,
    inactivity_threshold: Duration,
    sweep_interval: Duration,
    error_backoff: Duration,
}

impl RetentionSweeper {
    pub fn new(config: &Config, records: Arc<UserRecords>, clock: Arc<dyn Clock>) -> Arc<Self> {
        info!(
            "Initializing RetentionSweeper: inactivity threshold {} days, interval {:?}",
            config.inactivity_threshold.as_secs() / 86_400,
            config.sweep_interval
        );
        Arc::new(Self {
            records,
            clock,
            inactivity_threshold: config.inactivity_threshold,
            sweep_interval: config.sweep_interval,
            error_backoff: config.sweep_error_backoff,
        })
    }

    /// Removes every user inactive for longer than the threshold.
    pub fn sweep(&self) -> Vec<UserId> {
        let cutoff = clock::cutoff(self.clock.now(), self.inactivity_threshold);
        let removed = self.records.remove_inactive(cutoff);
        for user in &removed {
            info!("Removed inactive user {user} (no activity since before {cutoff}).");
        }
        if removed.is_empty() {
            debug!("Cleanup found no inactive users.");
        } else {
            info!("Cleanup finished. Users removed: {}", removed.len());
        }
        removed
    }
}

#[async_trait]
impl PeriodicTask for RetentionSweeper {
    fn name(&self) -> &'static str {
        "RetentionSweeper"
    }

    async fn run_once(&self) -> anyhow::Result<Duration> {
        self.sweep();
        Ok(self.sweep_interval)
    }

    fn backoff(&self) -> Duration {
        self.error_backoff
    }
}
