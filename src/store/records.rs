//! The user-records component.
//!
//! Subscriptions, snapshots, activity timestamps and dialog state of a user
//! are one record behind one lock. Every method takes the lock for a single
//! short critical section and never across an `.await`, so callers copy data
//! out, do their network work, then write back. Writes to a user that has been
//! removed in the meantime are ignored.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use chrono::DateTime;
use chrono::Utc;

use crate::dialog::state::DialogState;
use crate::rating::RatingFields;
use crate::rating::student::StudentId;

/// Chat-side identifier of a user.
pub type UserId = u64;

/// What the poller watches for a user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub student_id: StudentId,
    /// Subject names, in catalog order.
    pub subjects: Vec<String>,
}

#[derive(Debug, Default)]
struct UserRecord {
    subscription: Option<Subscription>,
    /// Last successfully observed fields, keyed by subject name.
    snapshots: HashMap<String, RatingFields>,
    last_activity: Option<DateTime<Utc>>,
    state: Option<DialogState>,
    /// Student id entered in the current dialog session.
    selection: Option<StudentId>,
}

#[derive(Debug, Default)]
pub struct UserRecords {
    users: Mutex<BTreeMap<UserId, UserRecord>>,
}

impl UserRecords {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<UserId, UserRecord>> {
        // Every critical section leaves the map consistent, so a panic while
        // holding the lock does not invalidate it.
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records an interaction, creating the user's record if needed.
    pub fn touch(&self, user: UserId, at: DateTime<Utc>) {
        self.lock().entry(user).or_default().last_activity = Some(at);
    }

    /// Records an interaction only for a user that still has a record.
    pub fn touch_existing(&self, user: UserId, at: DateTime<Utc>) -> bool {
        match self.lock().get_mut(&user) {
            Some(record) => {
                record.last_activity = Some(at);
                true
            }
            None => false,
        }
    }

    pub fn last_activity(&self, user: UserId) -> Option<DateTime<Utc>> {
        self.lock().get(&user).and_then(|r| r.last_activity)
    }

    /// Starts a fresh id entry: forgets the previous selection and waits for an id.
    pub fn begin_id_entry(&self, user: UserId, at: DateTime<Utc>) {
        let mut users = self.lock();
        let record = users.entry(user).or_default();
        record.selection = None;
        record.state = Some(DialogState::AwaitingId);
        record.last_activity = Some(at);
    }

    /// Replaces the user's subscription and selection. Snapshots taken for a
    /// previous subscription are dropped.
    pub fn subscribe(&self, user: UserId, subscription: Subscription, at: DateTime<Utc>) {
        let mut users = self.lock();
        let record = users.entry(user).or_default();
        record.selection = Some(subscription.student_id.clone());
        record.subscription = Some(subscription);
        record.snapshots.clear();
        record.last_activity = Some(at);
    }

    pub fn state(&self, user: UserId) -> Option<DialogState> {
        self.lock().get(&user).and_then(|r| r.state)
    }

    /// Moves an existing user to `state`. Returns `false` if the user is gone.
    pub fn set_state(&self, user: UserId, state: DialogState) -> bool {
        match self.lock().get_mut(&user) {
            Some(record) => {
                record.state = Some(state);
                true
            }
            None => false,
        }
    }

    pub fn selection(&self, user: UserId) -> Option<StudentId> {
        self.lock().get(&user).and_then(|r| r.selection.clone())
    }

    pub fn subscription(&self, user: UserId) -> Option<Subscription> {
        self.lock().get(&user).and_then(|r| r.subscription.clone())
    }

    /// Copies out every subscription of users with recorded activity.
    pub fn subscriptions(&self) -> Vec<(UserId, Subscription)> {
        self.lock()
            .iter()
            .filter(|(_, r)| r.last_activity.is_some())
            .filter_map(|(user, r)| r.subscription.clone().map(|s| (*user, s)))
            .collect()
    }

    pub fn has_subscriptions(&self) -> bool {
        self.lock().values().any(|r| r.subscription.is_some())
    }

    pub fn snapshot(&self, user: UserId, subject: &str) -> Option<RatingFields> {
        self.lock()
            .get(&user)
            .and_then(|r| r.snapshots.get(subject).cloned())
    }

    /// Whether the user's current subscription watches `student_id`.
    pub fn is_subscribed_to(&self, user: UserId, student_id: &StudentId) -> bool {
        self.lock()
            .get(&user)
            .and_then(|r| r.subscription.as_ref())
            .is_some_and(|s| &s.student_id == student_id)
    }

    /// Stores fields observed for `student_id`. Returns `false` without
    /// storing anything if the user is gone or no longer subscribed to that
    /// student.
    pub fn put_snapshot(
        &self,
        user: UserId,
        student_id: &StudentId,
        subject: &str,
        fields: RatingFields,
    ) -> bool {
        match self.lock().get_mut(&user) {
            Some(record)
                if record
                    .subscription
                    .as_ref()
                    .is_some_and(|s| &s.student_id == student_id) =>
            {
                record.snapshots.insert(subject.to_string(), fields);
                true
            }
            _ => false,
        }
    }

    pub fn snapshot_count(&self, user: UserId) -> usize {
        self.lock().get(&user).map_or(0, |r| r.snapshots.len())
    }

    /// Deletes everything known about a user.
    pub fn remove_user(&self, user: UserId) -> bool {
        self.lock().remove(&user).is_some()
    }

    /// Deletes every user whose last activity is older than `cutoff`, along
    /// with records that never saw any activity. Returns the removed ids.
    pub fn remove_inactive(&self, cutoff: DateTime<Utc>) -> Vec<UserId> {
        let mut users = self.lock();
        let stale: Vec<UserId> = users
            .iter()
            .filter(|(_, r)| r.last_activity.is_none_or(|t| t < cutoff))
            .map(|(user, _)| *user)
            .collect();
        for user in &stale {
            users.remove(user);
        }
        stale
    }

    /// Number of users active at or after `cutoff`.
    pub fn active_count(&self, cutoff: DateTime<Utc>) -> usize {
        self.lock()
            .values()
            .filter(|r| r.last_activity.is_some_and(|t| t >= cutoff))
            .count()
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.lock().contains_key(&user)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::TimeZone;

    use super::*;
    use crate::rating::Field;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap()
    }

    fn subscription(id: &str) -> Subscription {
        Subscription {
            student_id: StudentId::parse(id, 6).unwrap(),
            subjects: vec!["A".to_string(), "B".to_string()],
        }
    }

    fn student(id: &str) -> StudentId {
        StudentId::parse(id, 6).unwrap()
    }

    fn fields(grade: &str) -> RatingFields {
        [(Field::Grade, grade)].into_iter().collect()
    }

    #[test]
    fn test_subscribe_sets_selection_and_activity() {
        let records = UserRecords::new();
        records.subscribe(1, subscription("123456"), t0());

        assert_eq!(records.selection(1).unwrap().as_str(), "123456");
        assert_eq!(records.last_activity(1), Some(t0()));
        assert_eq!(records.subscriptions(), vec![(1, subscription("123456"))]);
        assert!(records.has_subscriptions());
    }

    #[test]
    fn test_resubscribe_overwrites_and_drops_snapshots() {
        let records = UserRecords::new();
        records.subscribe(1, subscription("123456"), t0());
        assert!(records.put_snapshot(1, &student("123456"), "A", fields("4")));

        records.subscribe(1, subscription("654321"), t0());

        assert_eq!(records.subscriptions().len(), 1);
        assert_eq!(records.selection(1).unwrap().as_str(), "654321");
        assert!(records.snapshot(1, "A").is_none());
    }

    #[test]
    fn test_put_snapshot_requires_subscription() {
        let records = UserRecords::new();
        let id = student("123456");
        assert!(!records.put_snapshot(1, &id, "A", fields("4")));
        assert!(!records.contains(1));

        records.touch(1, t0());
        assert!(!records.put_snapshot(1, &id, "A", fields("4")));

        records.subscribe(1, subscription("123456"), t0());
        assert!(records.put_snapshot(1, &id, "A", fields("4")));
        assert_eq!(records.snapshot(1, "A"), Some(fields("4")));
        assert!(records.put_snapshot(1, &id, "A", fields("5")));
        assert_eq!(records.snapshot(1, "A"), Some(fields("5")));
        assert_eq!(records.snapshot_count(1), 1);
    }

    #[test]
    fn test_put_snapshot_ignores_previous_student() {
        let records = UserRecords::new();
        records.subscribe(1, subscription("123456"), t0());
        records.subscribe(1, subscription("654321"), t0());

        assert!(!records.is_subscribed_to(1, &student("123456")));
        assert!(records.is_subscribed_to(1, &student("654321")));
        assert!(!records.put_snapshot(1, &student("123456"), "A", fields("2")));
        assert!(records.snapshot(1, "A").is_none());
    }

    #[test]
    fn test_remove_user_clears_everything() {
        let records = UserRecords::new();
        records.begin_id_entry(1, t0());
        records.subscribe(1, subscription("123456"), t0());
        records.put_snapshot(1, &student("123456"), "A", fields("4"));
        records.set_state(1, DialogState::ChoosingSubject);

        assert!(records.remove_user(1));

        assert!(!records.contains(1));
        assert!(records.snapshot(1, "A").is_none());
        assert!(records.subscription(1).is_none());
        assert!(records.state(1).is_none());
        assert!(records.last_activity(1).is_none());
        assert!(!records.remove_user(1));
    }

    #[test]
    fn test_writes_after_removal_are_noops() {
        let records = UserRecords::new();
        records.subscribe(1, subscription("123456"), t0());
        records.remove_user(1);

        assert!(!records.put_snapshot(1, &student("123456"), "A", fields("4")));
        assert!(!records.set_state(1, DialogState::ChoosingSubject));
        assert!(!records.touch_existing(1, t0()));
        assert!(records.is_empty());
    }

    #[test]
    fn test_begin_id_entry_clears_selection() {
        let records = UserRecords::new();
        records.subscribe(1, subscription("123456"), t0());
        records.begin_id_entry(1, t0());

        assert!(records.selection(1).is_none());
        assert_eq!(records.state(1), Some(DialogState::AwaitingId));
        // The running subscription keeps being polled until replaced
        assert!(records.subscription(1).is_some());
    }

    #[test]
    fn test_remove_inactive_uses_strict_cutoff() {
        let records = UserRecords::new();
        let cutoff = t0();
        records.touch(1, cutoff - Duration::seconds(1));
        records.touch(2, cutoff);
        records.touch(3, cutoff + Duration::days(1));

        let removed = records.remove_inactive(cutoff);

        assert_eq!(removed, vec![1]);
        assert!(records.contains(2));
        assert!(records.contains(3));
        assert_eq!(records.active_count(cutoff), 2);
    }
}
