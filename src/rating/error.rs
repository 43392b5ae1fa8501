#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RatingError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Rating page responded with status {status} for {url}.")]
    BadStatus { status: u16, url: String },

    #[error("Student {student_id} not found in the table for subject `{subject}`.")]
    StudentNotFound { student_id: String, subject: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RatingError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RatingError::StudentNotFound { .. })
    }
}

impl From<wreq::Error> for RatingError {
    fn from(e: wreq::Error) -> Self {
        RatingError::RequestFailed(Box::new(e))
    }
}
