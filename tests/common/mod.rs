//! Common test utilities and mock implementations.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;
use rating_bot::clock::ManualClock;
use rating_bot::config::Config;
use rating_bot::rating::Field;
use rating_bot::rating::RatingFields;
use rating_bot::rating::RatingSource;
use rating_bot::rating::error::RatingError;
use rating_bot::rating::student::StudentId;
use rating_bot::rating::subject::Subject;
use rating_bot::render::RatingCard;
use rating_bot::render::Renderer;
use rating_bot::store::UserId;
use rating_bot::transport::Keyboard;
use rating_bot::transport::Transport;
use rating_bot::transport::error::TransportError;

/// 12:00 in Moscow, inside the site's opening hours.
#[allow(dead_code)]
pub fn daytime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

/// 21:00 in Moscow, while the site is offline.
#[allow(dead_code)]
pub fn nighttime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn manual_clock(now: DateTime<Utc>) -> Arc<ManualClock> {
    Arc::new(ManualClock::new(now))
}

/// Configuration with every delay removed.
#[allow(dead_code)]
pub fn test_config() -> Config {
    let mut config = Config::new();
    config.discord_token = "test-token".to_string();
    config.poll_fetch_delay = Duration::ZERO;
    config.warmup_fetch_delay = Duration::ZERO;
    config
}

#[allow(dead_code)]
pub fn fields(values: &[(Field, &str)]) -> RatingFields {
    values.iter().map(|(f, v)| (*f, *v)).collect()
}

// MOCK SOURCE

/// Rating source answering from in-memory tables keyed by subject name.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct MockSource {
    pub state: Arc<RwLock<MockSourceState>>,
}

#[derive(Default)]
#[allow(dead_code)]
pub struct MockSourceState {
    pub ratings: HashMap<String, RatingFields>,
    pub fetches: Vec<(String, String)>,
    /// Called after a fetch is recorded and before it answers.
    pub on_fetch: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

#[allow(dead_code)]
impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rating(&self, subject: &str, fields: RatingFields) {
        self.state
            .write()
            .unwrap()
            .ratings
            .insert(subject.to_string(), fields);
    }

    pub fn remove_rating(&self, subject: &str) {
        self.state.write().unwrap().ratings.remove(subject);
    }

    pub fn set_on_fetch(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        self.state.write().unwrap().on_fetch = Some(Arc::new(hook));
    }

    pub fn fetch_count(&self) -> usize {
        self.state.read().unwrap().fetches.len()
    }
}

#[async_trait]
impl RatingSource for MockSource {
    async fn fetch(
        &self,
        subject: &Subject,
        student_id: &StudentId,
    ) -> Result<RatingFields, RatingError> {
        self.state
            .write()
            .unwrap()
            .fetches
            .push((subject.name.clone(), student_id.to_string()));

        let hook = self.state.read().unwrap().on_fetch.clone();
        if let Some(hook) = hook {
            hook(&subject.name);
        }
        self.state
            .read()
            .unwrap()
            .ratings
            .get(&subject.name)
            .cloned()
            .ok_or_else(|| RatingError::StudentNotFound {
                student_id: student_id.to_string(),
                subject: subject.name.clone(),
            })
    }
}

// RECORDING TRANSPORT

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Sent {
    Text {
        user: UserId,
        text: String,
        keyboard: Keyboard,
    },
    Image {
        user: UserId,
        caption: String,
    },
}

/// Transport that keeps every outbound message.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Sent>>,
    pub failing: Mutex<bool>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                Sent::Image { .. } => None,
            })
            .collect()
    }

    pub fn last(&self) -> Option<Sent> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(
        &self,
        user: UserId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), TransportError> {
        if *self.failing.lock().unwrap() {
            return Err(TransportError::SendFailed("offline".into()));
        }
        self.sent.lock().unwrap().push(Sent::Text {
            user,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        });
        Ok(())
    }

    async fn send_image(
        &self,
        user: UserId,
        _png: Vec<u8>,
        caption: &str,
    ) -> Result<(), TransportError> {
        if *self.failing.lock().unwrap() {
            return Err(TransportError::SendFailed("offline".into()));
        }
        self.sent.lock().unwrap().push(Sent::Image {
            user,
            caption: caption.to_string(),
        });
        Ok(())
    }
}

// STUB RENDERER

/// Renderer that returns a fixed byte string and remembers the cards.
#[derive(Default)]
#[allow(dead_code)]
pub struct StubRenderer {
    pub cards: Mutex<Vec<RatingCard>>,
}

impl Renderer for StubRenderer {
    fn render(&self, card: &RatingCard) -> anyhow::Result<Vec<u8>> {
        self.cards.lock().unwrap().push(card.clone());
        Ok(b"png".to_vec())
    }
}
