use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("A record-book number must consist of exactly {expected_len} digits.")]
    InvalidStudentId { expected_len: usize },
}

/// A validated record-book number.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StudentId(String);

impl StudentId {
    /// Accepts exactly `len` ASCII digits, ignoring surrounding whitespace.
    pub fn parse(text: &str, len: usize) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.len() == len && text.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(text.to_string()))
        } else {
            Err(ValidationError::InvalidStudentId { expected_len: len })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
