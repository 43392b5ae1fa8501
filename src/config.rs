//! Runtime configuration loaded from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::Offset;
use chrono::Timelike;
use chrono::Utc;

use crate::error::AppError;
use crate::rating::subject::SubjectCatalog;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Hours of the day (local to the rating site) during which the site is
/// offline and nothing should be fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SiteHours {
    /// First unavailable hour, inclusive.
    pub unavailable_from: u32,
    /// First available hour again, exclusive end of the window.
    pub unavailable_until: u32,
    pub utc_offset: FixedOffset,
}

impl SiteHours {
    pub fn new(unavailable_from: u32, unavailable_until: u32, utc_offset: FixedOffset) -> Self {
        Self {
            unavailable_from,
            unavailable_until,
            utc_offset,
        }
    }

    /// Converts a UTC instant into the site's local time.
    pub fn local(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.utc_offset)
    }

    /// Whether the site is offline at `now`. The window may wrap past midnight.
    pub fn is_unavailable(&self, now: DateTime<Utc>) -> bool {
        let hour = self.local(now).hour();
        let (from, until) = (self.unavailable_from, self.unavailable_until);
        if from == until {
            false
        } else if from > until {
            hour >= from || hour < until
        } else {
            hour >= from && hour < until
        }
    }
}

impl Default for SiteHours {
    fn default() -> Self {
        // Moscow time has no DST, so a fixed offset is exact.
        Self::new(19, 10, utc_offset(3).unwrap_or_else(|| Utc.fix()))
    }
}

fn utc_offset(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours * 3600)
}

#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub logs_path: PathBuf,
    pub rating_url: String,
    pub student_id_length: usize,
    pub min_table_columns: usize,
    pub poll_interval: Duration,
    pub poll_fetch_delay: Duration,
    pub poll_error_backoff: Duration,
    pub warmup_fetch_delay: Duration,
    pub inactivity_threshold: Duration,
    pub sweep_interval: Duration,
    pub sweep_error_backoff: Duration,
    pub request_timeout: Duration,
    pub reply_timeout: Duration,
    pub site_hours: SiteHours,
    pub subjects: SubjectCatalog,
}

impl Config {
    /// Creates a configuration holding only defaults. Call [`Config::load`]
    /// to apply the environment.
    pub fn new() -> Self {
        Self {
            discord_token: String::new(),
            logs_path: PathBuf::from("logs"),
            rating_url: "https://rating.vsuet.ru/web/Ved/Ved.aspx".to_string(),
            student_id_length: 6,
            min_table_columns: 3,
            poll_interval: Duration::from_secs(3600),
            poll_fetch_delay: Duration::from_secs(45),
            poll_error_backoff: Duration::from_secs(60),
            warmup_fetch_delay: Duration::from_secs(1),
            inactivity_threshold: Duration::from_secs(120 * SECONDS_PER_DAY),
            sweep_interval: Duration::from_secs(SECONDS_PER_DAY),
            sweep_error_backoff: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(40),
            reply_timeout: Duration::from_secs(30),
            site_hours: SiteHours::default(),
            subjects: SubjectCatalog::default(),
        }
    }

    /// Overrides defaults from environment variables.
    pub fn load(&mut self) -> Result<(), AppError> {
        self.discord_token = std::env::var("DISCORD_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::MissingConfig {
                key: "DISCORD_TOKEN".to_string(),
            })?;

        if let Ok(path) = std::env::var("LOGS_PATH") {
            self.logs_path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("RATING_URL") {
            self.rating_url = url;
        }

        self.student_id_length = env_parse("STUDENT_ID_LENGTH", self.student_id_length)?;
        self.min_table_columns = env_parse("MIN_TABLE_COLUMNS", self.min_table_columns)?;
        self.poll_interval = env_secs("POLL_INTERVAL", self.poll_interval)?;
        self.poll_fetch_delay = env_secs("POLL_FETCH_DELAY", self.poll_fetch_delay)?;
        self.warmup_fetch_delay = env_secs("WARMUP_FETCH_DELAY", self.warmup_fetch_delay)?;
        self.sweep_interval = env_secs("CLEANUP_INTERVAL", self.sweep_interval)?;
        self.request_timeout = env_secs("REQUEST_TIMEOUT", self.request_timeout)?;
        self.reply_timeout = env_secs("REPLY_TIMEOUT", self.reply_timeout)?;

        let inactive_days = env_parse(
            "INACTIVE_DAYS",
            self.inactivity_threshold.as_secs() / SECONDS_PER_DAY,
        )?;
        self.inactivity_threshold = Duration::from_secs(inactive_days * SECONDS_PER_DAY);

        let from = env_parse("SITE_UNAVAILABLE_FROM", self.site_hours.unavailable_from)?;
        let until = env_parse("SITE_UNAVAILABLE_UNTIL", self.site_hours.unavailable_until)?;
        for (key, hour) in [("SITE_UNAVAILABLE_FROM", from), ("SITE_UNAVAILABLE_UNTIL", until)] {
            if hour > 23 {
                return Err(AppError::InvalidConfig {
                    key: key.to_string(),
                    value: hour.to_string(),
                });
            }
        }
        let offset_hours = env_parse(
            "UTC_OFFSET_HOURS",
            self.site_hours.utc_offset.local_minus_utc() / 3600,
        )?;
        let offset = utc_offset(offset_hours).ok_or_else(|| AppError::InvalidConfig {
            key: "UTC_OFFSET_HOURS".to_string(),
            value: offset_hours.to_string(),
        })?;
        self.site_hours = SiteHours::new(from, until, offset);

        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::InvalidConfig {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(default),
    }
}

fn env_secs(key: &str, default: Duration) -> Result<Duration, AppError> {
    env_parse(key, default.as_secs()).map(Duration::from_secs)
}
