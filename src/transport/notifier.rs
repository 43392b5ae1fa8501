//! Fire-and-forget delivery on top of a [`Transport`].

use std::sync::Arc;
use std::time::Duration;

use log::error;
use log::info;
use tokio::time::timeout;

use crate::store::UserId;
use crate::transport::Keyboard;
use crate::transport::Transport;
use crate::transport::error::TransportError;

/// Wraps a transport with a reply timeout. Failures are logged and reported
/// as `false`; nothing is retried.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn Transport>,
    reply_timeout: Duration,
}

impl Notifier {
    pub fn new(transport: Arc<dyn Transport>, reply_timeout: Duration) -> Self {
        Self {
            transport,
            reply_timeout,
        }
    }

    pub async fn text(&self, user: UserId, text: &str, keyboard: Keyboard) -> bool {
        let result = timeout(
            self.reply_timeout,
            self.transport.send_text(user, text, &keyboard),
        )
        .await
        .unwrap_or(Err(TransportError::Timeout(self.reply_timeout)));

        Self::report(user, "message", result)
    }

    pub async fn image(&self, user: UserId, png: Vec<u8>, caption: &str) -> bool {
        let result = timeout(
            self.reply_timeout,
            self.transport.send_image(user, png, caption),
        )
        .await
        .unwrap_or(Err(TransportError::Timeout(self.reply_timeout)));

        Self::report(user, "image", result)
    }

    fn report(user: UserId, what: &str, result: Result<(), TransportError>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to send {what} to user {user}: {e}");
                false
            }
        }
    }

    /// Sends a change notification and logs the delivery.
    pub async fn notify(&self, user: UserId, text: &str) -> bool {
        let sent = self.text(user, text, Keyboard::None).await;
        if sent {
            info!("Change notification sent to user {user}.");
        }
        sent
    }
}
