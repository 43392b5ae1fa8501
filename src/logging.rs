//! Log output: stdout plus a daily rotated file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;
use crate::error::AppError;

const LOG_FILE_PREFIX: &str = "rating-bot";
const KEPT_LOG_FILES: usize = 7;
const DEFAULT_FILTER: &str = "rating_bot=info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn setup_logging(config: &Config) -> Result<(), AppError> {
    let appender = file_appender(&config.logs_path)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    keep_alive(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stdout).with_ansi(true))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()
        .map_err(|e| AppError::ConfigurationError {
            msg: format!("Failed to install log subscriber: {e}"),
        })
}

/// Daily `rating-bot.<date>.log` files under `dir`, oldest beyond the
/// retention count deleted.
fn file_appender(dir: &Path) -> Result<RollingFileAppender, AppError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(KEPT_LOG_FILES)
        .build(dir)
        .map_err(|e| AppError::ConfigurationError {
            msg: format!(
                "Failed to open log directory '{}': {e}",
                dir.to_string_lossy()
            ),
        })
}

// The file writer flushes when its guard drops.
fn keep_alive(guard: WorkerGuard) {
    std::mem::forget(guard);
}
