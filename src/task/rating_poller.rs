//! Background task that re-fetches subscribed ratings and reports changes.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::FixedOffset;
use governor::Quota;
use governor::RateLimiter;
use governor::middleware::NoOpMiddleware;
use governor::nanos::Nanos;
use governor::state::keyed::HashMapStateStore;
use log::debug;
use log::info;
use log::warn;
use tokio::time::sleep;

use crate::clock;
use crate::clock::Clock;
use crate::clock::RateLimitClock;
use crate::config::Config;
use crate::config::SiteHours;
use crate::rating::RatingSource;
use crate::rating::SENTINEL;
use crate::rating::diff::FieldChange;
use crate::rating::diff::diff;
use crate::rating::subject::SubjectCatalog;
use crate::store::Subscription;
use crate::store::UserId;
use crate::store::UserRecords;
use crate::task::PeriodicTask;
use crate::transport::notifier::Notifier;

/// Outcome of one polling cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// The site was unavailable and nothing was fetched.
    pub gated: bool,
    pub fetched: usize,
    pub failures: usize,
    /// Failures that were logged as warnings.
    pub warnings: usize,
    pub notifications: usize,
}

type WarningLimiter =
    RateLimiter<UserId, HashMapStateStore<UserId>, RateLimitClock, NoOpMiddleware<Nanos>>;

/// Task that periodically compares every subscription against the site.
pub struct RatingPoller {
    records: Arc<UserRecords>,
    source: Arc<dyn RatingSource>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    subjects: SubjectCatalog,
    site_hours: SiteHours,
    poll_interval: Duration,
    fetch_delay: Duration,
    error_backoff: Duration,
    inactivity_threshold: Duration,
    failure_warnings: WarningLimiter,
}

impl RatingPoller {
    pub fn new(
        config: &Config,
        records: Arc<UserRecords>,
        source: Arc<dyn RatingSource>,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        info!(
            "Initializing RatingPoller with poll interval {:?}",
            config.poll_interval
        );
        let failure_warnings = RateLimiter::hashmap_with_clock(
            Quota::per_hour(NonZeroU32::MIN),
            RateLimitClock::new(clock.clone()),
        );
        Arc::new(Self {
            records,
            source,
            notifier,
            clock,
            subjects: config.subjects.clone(),
            site_hours: config.site_hours,
            poll_interval: config.poll_interval,
            fetch_delay: config.poll_fetch_delay,
            error_backoff: config.poll_error_backoff,
            inactivity_threshold: config.inactivity_threshold,
            failure_warnings,
        })
    }

    /// Runs a single pass over all subscriptions.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        let now = self.clock.now();

        if self.site_hours.is_unavailable(now) {
            info!(
                "Rating site is unavailable at {}, skipping cycle.",
                self.site_hours.local(now).format("%H:%M")
            );
            report.gated = true;
            return report;
        }

        if !self.records.has_subscriptions() {
            debug!("No subscriptions to check.");
            return report;
        }

        let active = self
            .records
            .active_count(clock::cutoff(now, self.inactivity_threshold));
        info!("Starting rating check. Active users: {active}");

        let mut first_fetch = true;
        for (user, subscription) in self.records.subscriptions() {
            self.check_user(user, &subscription, &mut first_fetch, &mut report)
                .await;
        }
        self.failure_warnings.retain_recent();

        debug!("Finished rating check: {report:?}");
        report
    }

    async fn check_user(
        &self,
        user: UserId,
        subscription: &Subscription,
        first_fetch: &mut bool,
        report: &mut CycleReport,
    ) {
        let student_id = &subscription.student_id;
        for name in &subscription.subjects {
            if !self.records.is_subscribed_to(user, student_id) {
                debug!("Subscription of user {user} ended mid-cycle.");
                return;
            }
            let Some(subject) = self.subjects.find(name) else {
                warn!("Subscription of user {user} names unknown subject `{name}`.");
                continue;
            };

            if !std::mem::take(first_fetch) {
                sleep(self.fetch_delay).await;
            }

            let current = match self.source.fetch(subject, student_id).await {
                Ok(fields) => fields,
                Err(e) => {
                    report.failures += 1;
                    if self.should_warn(user) {
                        report.warnings += 1;
                        warn!(
                            "Failed to fetch {} for {student_id} (user {user}): {e}",
                            subject.name
                        );
                    } else {
                        debug!("Failed to fetch {} for user {user}: {e}", subject.name);
                    }
                    continue;
                }
            };
            report.fetched += 1;

            if !self.records.is_subscribed_to(user, student_id) {
                debug!("Subscription of user {user} ended while fetching.");
                return;
            }
            let previous = self.records.snapshot(user, &subject.name);
            let changes = diff(previous.as_ref(), &current);
            if !changes.is_empty() {
                let local = self.site_hours.local(self.clock.now());
                let text = format_notification(&subject.name, local, &changes);
                if self.notifier.notify(user, &text).await {
                    report.notifications += 1;
                    self.records.touch_existing(user, self.clock.now());
                }
            }

            self.records
                .put_snapshot(user, student_id, &subject.name, current);
        }
    }

    /// At most one fetch-failure warning per user per hour.
    fn should_warn(&self, user: UserId) -> bool {
        self.failure_warnings.check_key(&user).is_ok()
    }
}

#[async_trait]
impl PeriodicTask for RatingPoller {
    fn name(&self) -> &'static str {
        "RatingPoller"
    }

    async fn run_once(&self) -> anyhow::Result<Duration> {
        let report = self.run_cycle().await;
        if !report.gated {
            info!(
                "Rating check done: {} fetched, {} failed, {} notifications.",
                report.fetched, report.failures, report.notifications
            );
        }
        Ok(self.poll_interval)
    }

    fn backoff(&self) -> Duration {
        self.error_backoff
    }
}

/// Builds the change notification sent to a user.
pub fn format_notification(
    subject: &str,
    at: DateTime<FixedOffset>,
    changes: &[FieldChange],
) -> String {
    let mut text = format!("Изменён рейтинг по предмету: {subject}\n\n");
    text.push_str(&format!("Время: {}\n\n", at.format("%d.%m.%Y %H:%M")));
    text.push_str("Изменения:\n\n");
    for change in changes {
        text.push_str(&format!(
            "{}:\nБыло: {}\nСтало: {}\n\n",
            change.field.label(),
            change.old.as_deref().unwrap_or(SENTINEL),
            change.new
        ));
    }
    text
}
