use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to send message: {0}")]
    SendFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("No reply from the chat API within {0:?}.")]
    Timeout(Duration),
}
