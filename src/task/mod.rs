//! Background tasks for rating polling and inactive-user cleanup.

pub mod rating_poller;
pub mod retention_sweeper;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use log::error;
use log::info;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// A unit of work repeated on a schedule.
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs one iteration and returns how long to wait before the next one.
    async fn run_once(&self) -> anyhow::Result<Duration>;

    /// Delay before retrying after a failed or panicking iteration.
    fn backoff(&self) -> Duration;
}

/// Spawns the loop driving `task` until `token` is cancelled. Cancellation is
/// observed between iterations.
pub fn spawn<T: PeriodicTask + 'static>(task: Arc<T>, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting {} loop.", task.name());
        loop {
            let delay = match AssertUnwindSafe(task.run_once()).catch_unwind().await {
                Ok(Ok(next)) => next,
                Ok(Err(e)) => {
                    error!("{} iteration failed: {e:#}", task.name());
                    task.backoff()
                }
                Err(_) => {
                    error!("{} iteration panicked.", task.name());
                    task.backoff()
                }
            };

            tokio::select! {
                _ = sleep(delay) => {}
                _ = token.cancelled() => {
                    info!("Stopping {} loop.", task.name());
                    break;
                }
            }
        }
    })
}
