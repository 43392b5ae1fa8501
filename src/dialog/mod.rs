//! Guided dialog: record-book entry, subject selection and rating cards.

pub mod error;
pub mod messages;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use log::error;
use log::info;
use log::warn;

use crate::clock::Clock;
use crate::config::Config;
use crate::config::SiteHours;
use crate::dialog::error::DialogError;
use crate::dialog::state::Action;
use crate::dialog::state::DialogState;
use crate::dialog::state::Input;
use crate::dialog::state::transition;
use crate::rating::RatingSource;
use crate::rating::student::StudentId;
use crate::rating::subject::SubjectCatalog;
use crate::render::RatingCard;
use crate::render::Renderer;
use crate::store::Subscription;
use crate::store::UserId;
use crate::store::UserRecords;
use crate::transport::Keyboard;
use crate::transport::notifier::Notifier;

/// Handles inbound messages, one call per message.
pub struct Conversation {
    records: Arc<UserRecords>,
    source: Arc<dyn RatingSource>,
    renderer: Arc<dyn Renderer>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    subjects: SubjectCatalog,
    student_id_length: usize,
    site_hours: SiteHours,
    warmup_fetch_delay: Duration,
}

impl Conversation {
    pub fn new(
        config: &Config,
        records: Arc<UserRecords>,
        source: Arc<dyn RatingSource>,
        renderer: Arc<dyn Renderer>,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            records,
            source,
            renderer,
            notifier,
            clock,
            subjects: config.subjects.clone(),
            student_id_length: config.student_id_length,
            site_hours: config.site_hours,
            warmup_fetch_delay: config.warmup_fetch_delay,
        }
    }

    pub async fn handle_text(&self, user: UserId, text: &str) {
        let input = Input::parse(text);
        let now = self.clock.now();
        if input != Input::Cancel {
            self.records.touch(user, now);
        }

        let state = self.records.state(user);
        let action = transition(state, &input);
        debug!("User {user} in state {state:?} sent {input:?}, action {action:?}");

        if action.needs_site() && self.site_hours.is_unavailable(now) {
            self.notifier
                .text(
                    user,
                    &messages::site_unavailable(&self.site_hours),
                    Keyboard::SubjectActions,
                )
                .await;
            return;
        }

        match action {
            Action::Greet => {
                self.notifier
                    .text(user, messages::GREETING, Keyboard::Start)
                    .await;
            }
            Action::Reset => {
                if self.records.remove_user(user) {
                    info!("User {user} cancelled, record removed.");
                }
                self.notifier
                    .text(user, messages::CANCELLED, Keyboard::Start)
                    .await;
            }
            Action::ShowMainMenu => {
                self.notifier
                    .text(user, messages::MAIN_MENU, Keyboard::MainMenu)
                    .await;
            }
            Action::PromptForId => {
                self.records.begin_id_entry(user, now);
                self.notifier
                    .text(
                        user,
                        &messages::enter_id(self.student_id_length),
                        Keyboard::Cancel,
                    )
                    .await;
            }
            Action::Hint => {
                self.notifier.text(user, messages::HINT, Keyboard::Start).await;
            }
            Action::SubmitId(text) => self.submit_id(user, &text).await,
            Action::ShowSubjects => match self.require_selection(user) {
                Ok(_) => self.send_subject_menu(user).await,
                Err(e) => self.session_expired(user, e).await,
            },
            Action::PickSubject(text) => match self.require_selection(user) {
                Ok(student_id) => self.pick_subject(user, &student_id, &text).await,
                Err(e) => self.session_expired(user, e).await,
            },
        }
    }

    fn require_selection(&self, user: UserId) -> Result<StudentId, DialogError> {
        self.records
            .selection(user)
            .ok_or(DialogError::SessionExpired { user })
    }

    async fn session_expired(&self, user: UserId, e: DialogError) {
        debug!("{e}");
        self.notifier
            .text(user, messages::SESSION_EXPIRED, Keyboard::Start)
            .await;
    }

    async fn send_subject_menu(&self, user: UserId) {
        self.notifier
            .text(
                user,
                &messages::subject_menu(&self.subjects),
                Keyboard::Subjects(self.subjects.len()),
            )
            .await;
    }

    async fn submit_id(&self, user: UserId, text: &str) {
        let student_id = match StudentId::parse(text, self.student_id_length) {
            Ok(id) => id,
            Err(e) => {
                debug!("User {user} entered an invalid record book: {e}");
                self.notifier
                    .text(
                        user,
                        &messages::invalid_id(self.student_id_length),
                        Keyboard::Cancel,
                    )
                    .await;
                return;
            }
        };

        let subscription = Subscription {
            student_id: student_id.clone(),
            subjects: self.subjects.names(),
        };
        self.records.subscribe(user, subscription, self.clock.now());
        info!("User {user} subscribed to record book {student_id}.");

        self.notifier
            .text(user, messages::CONNECTING, Keyboard::None)
            .await;
        self.warm_up(user, &student_id).await;
        self.notifier
            .text(user, messages::CONNECTED, Keyboard::None)
            .await;

        if !self.records.set_state(user, DialogState::ChoosingSubject) {
            debug!("User {user} left during warm-up.");
            return;
        }
        self.send_subject_menu(user).await;
    }

    /// Seeds snapshots so the first poll only reports real changes.
    async fn warm_up(&self, user: UserId, student_id: &StudentId) {
        let mut seeded = 0;
        for (i, subject) in self.subjects.iter().enumerate() {
            if !self.records.is_subscribed_to(user, student_id) {
                debug!("Subscription of user {user} changed during warm-up.");
                break;
            }
            if i > 0 {
                tokio::time::sleep(self.warmup_fetch_delay).await;
            }
            match self.source.fetch(subject, student_id).await {
                Ok(fields) => {
                    if self
                        .records
                        .put_snapshot(user, student_id, &subject.name, fields)
                    {
                        seeded += 1;
                    }
                }
                Err(e) => debug!("Warm-up fetch of {} for user {user} failed: {e}", subject.name),
            }
        }
        info!(
            "Seeded {seeded}/{} snapshots for user {user}.",
            self.subjects.len()
        );
    }

    async fn pick_subject(&self, user: UserId, student_id: &StudentId, text: &str) {
        let text = text.trim();
        if !is_integer(text) {
            self.notifier
                .text(user, messages::NOT_A_NUMBER, Keyboard::Cancel)
                .await;
            return;
        }
        // Negative or too large to parse is out of range like any other miss.
        let Some(subject) = text.parse::<usize>().ok().and_then(|p| self.subjects.get(p)) else {
            self.notifier
                .text(
                    user,
                    &messages::out_of_range(self.subjects.len()),
                    Keyboard::Cancel,
                )
                .await;
            return;
        };

        self.notifier
            .text(user, messages::LOADING, Keyboard::None)
            .await;

        let fields = match self.source.fetch(subject, student_id).await {
            Ok(fields) => fields,
            Err(e) => {
                if !e.is_not_found() {
                    warn!("Failed to fetch {} for user {user}: {e}", subject.name);
                }
                self.notifier
                    .text(
                        user,
                        &messages::student_not_found(student_id.as_str(), &subject.name),
                        Keyboard::SubjectActions,
                    )
                    .await;
                return;
            }
        };

        self.notifier
            .text(user, messages::LOADED, Keyboard::SubjectActions)
            .await;

        let card = RatingCard {
            student_id: student_id.to_string(),
            subject: subject.name.clone(),
            fields,
        };
        match self.renderer.render(&card) {
            Ok(png) => {
                self.notifier
                    .image(user, png, &messages::rating_caption(&subject.name))
                    .await;
            }
            Err(e) => error!("Failed to render rating card for user {user}: {e:#}"),
        }
    }
}

/// An optionally signed run of ASCII digits.
fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::rating::Field;
    use crate::rating::MockRatingSource;
    use crate::rating::RatingFields;
    use crate::rating::error::RatingError;
    use crate::transport::Transport;
    use crate::transport::error::TransportError;

    #[derive(Default)]
    struct Sent(Mutex<Vec<String>>);

    #[async_trait]
    impl Transport for Sent {
        async fn send_text(
            &self,
            _user: UserId,
            text: &str,
            _keyboard: &Keyboard,
        ) -> Result<(), TransportError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn send_image(
            &self,
            _user: UserId,
            _png: Vec<u8>,
            caption: &str,
        ) -> Result<(), TransportError> {
            self.0.lock().unwrap().push(format!("image: {caption}"));
            Ok(())
        }
    }

    struct NoRender;

    impl Renderer for NoRender {
        fn render(&self, _card: &RatingCard) -> anyhow::Result<Vec<u8>> {
            Ok(vec![1, 2, 3])
        }
    }

    fn conversation(source: MockRatingSource, sent: Arc<Sent>) -> (Conversation, Arc<UserRecords>) {
        let mut config = Config::new();
        config.warmup_fetch_delay = Duration::ZERO;
        let records = Arc::new(UserRecords::new());
        // noon in Moscow
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let conversation = Conversation::new(
            &config,
            records.clone(),
            Arc::new(source),
            Arc::new(NoRender),
            Notifier::new(sent, Duration::from_secs(1)),
            Arc::new(clock),
        );
        (conversation, records)
    }

    #[tokio::test]
    async fn test_warm_up_seeds_snapshots_before_menu() {
        let mut source = MockRatingSource::new();
        source.expect_fetch().returning(|subject, _| {
            if subject.reference == "251282" {
                Err(RatingError::StudentNotFound {
                    student_id: "123456".to_string(),
                    subject: subject.name.clone(),
                })
            } else {
                Ok([(Field::Grade, "5")].into_iter().collect::<RatingFields>())
            }
        });
        let sent = Arc::new(Sent::default());
        let (conversation, records) = conversation(source, sent.clone());

        conversation.handle_text(1, "Ввести номер зачётной книжки").await;
        conversation.handle_text(1, "123456").await;

        assert_eq!(records.state(1), Some(DialogState::ChoosingSubject));
        assert_eq!(records.snapshot_count(1), 8);
        let sent = sent.0.lock().unwrap();
        assert_eq!(sent[1], messages::CONNECTING);
        assert_eq!(sent[2], messages::CONNECTED);
        assert!(sent[3].starts_with("Введите номер предмета:"));
    }

    #[test]
    fn test_is_integer() {
        assert!(is_integer("3"));
        assert!(is_integer("-3"));
        assert!(is_integer("+12"));
        assert!(is_integer("99999999999999999999"));
        assert!(!is_integer(""));
        assert!(!is_integer("-"));
        assert!(!is_integer("2.5"));
        assert!(!is_integer("два"));
    }

    #[tokio::test]
    async fn test_warm_up_drops_fields_of_replaced_student() {
        let records = Arc::new(UserRecords::new());
        let mut source = MockRatingSource::new();
        let hook_records = records.clone();
        source.expect_fetch().returning(move |_, student_id| {
            // the user enters another number while the first warm-up runs
            if student_id.as_str() == "123456" {
                hook_records.subscribe(
                    1,
                    Subscription {
                        student_id: StudentId::parse("654321", 6).unwrap(),
                        subjects: vec![],
                    },
                    Utc::now(),
                );
            }
            Ok([(Field::RecordBook, student_id.as_str())].into_iter().collect::<RatingFields>())
        });
        let sent = Arc::new(Sent::default());
        let mut config = Config::new();
        config.warmup_fetch_delay = Duration::ZERO;
        let conversation = Conversation::new(
            &config,
            records.clone(),
            Arc::new(source),
            Arc::new(NoRender),
            Notifier::new(sent, Duration::from_secs(1)),
            Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())),
        );

        conversation.handle_text(1, "Ввести номер зачётной книжки").await;
        conversation.handle_text(1, "123456").await;

        assert_eq!(records.selection(1).unwrap().as_str(), "654321");
        assert_eq!(records.snapshot_count(1), 0);
    }

    #[tokio::test]
    async fn test_failed_view_reports_not_found() {
        let mut source = MockRatingSource::new();
        source
            .expect_fetch()
            .returning(|_, _| Err(RatingError::BadStatus { status: 500, url: "x".to_string() }));
        let sent = Arc::new(Sent::default());
        let (conversation, records) = conversation(source, sent.clone());

        conversation.handle_text(1, "Ввести номер зачётной книжки").await;
        conversation.handle_text(1, "654321").await;
        conversation.handle_text(1, "2").await;

        assert_eq!(records.state(1), Some(DialogState::ChoosingSubject));
        let sent = sent.0.lock().unwrap();
        assert_eq!(
            sent.last().unwrap(),
            "Студент 654321 не найден в таблице по предмету 'Иностранный язык (второй)'."
        );
    }
}
