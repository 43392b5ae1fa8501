//! VSUET public rating site.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rand::seq::IndexedRandom;
use wreq::Client;
use wreq::header::USER_AGENT;

use crate::rating::RatingFields;
use crate::rating::RatingSource;
use crate::rating::error::RatingError;
use crate::rating::student::StudentId;
use crate::rating::subject::Subject;
use crate::rating::table::parse_student_row;

/// Browser identities rotated between requests.
pub const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/120.0.0.0 Safari/537.36",
];

/// Scrapes the rating table page `<base_url>?id=<subject reference>`.
pub struct VsuetSource {
    pub base_url: String,
    min_columns: usize,
    client: Client,
}

impl VsuetSource {
    pub fn new(
        base_url: impl Into<String>,
        min_columns: usize,
        request_timeout: Duration,
    ) -> Result<Self, RatingError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RatingError::ClientBuild(Box::new(e)))?;

        Ok(Self {
            base_url: base_url.into(),
            min_columns,
            client,
        })
    }

    pub fn page_url(&self, subject: &Subject) -> String {
        format!("{}?id={}", self.base_url, subject.reference)
    }

    fn random_user_agent() -> &'static str {
        USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }
}

#[async_trait]
impl RatingSource for VsuetSource {
    async fn fetch(
        &self,
        subject: &Subject,
        student_id: &StudentId,
    ) -> Result<RatingFields, RatingError> {
        let url = self.page_url(subject);
        let user_agent = Self::random_user_agent();
        debug!("Fetching {url} for student {student_id}.");

        let resp = self
            .client
            .get(&url)
            .header(USER_AGENT, user_agent)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RatingError::BadStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = resp.text().await?;
        parse_student_row(&body, student_id.as_str(), self.min_columns).ok_or_else(|| {
            RatingError::StudentNotFound {
                student_id: student_id.to_string(),
                subject: subject.name.clone(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_uses_subject_reference() {
        let source = VsuetSource::new("https://example.test/Ved.aspx", 3, Duration::from_secs(1))
            .expect("Failed to build source");
        let subject = Subject::new("Физика", "251282");
        assert_eq!(
            source.page_url(&subject),
            "https://example.test/Ved.aspx?id=251282"
        );
    }

    #[test]
    fn test_user_agent_comes_from_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&VsuetSource::random_user_agent()));
        }
    }
}
