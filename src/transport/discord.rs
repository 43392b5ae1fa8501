//! Discord direct messages as the chat transport.

use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude::CreateAttachment;
use poise::serenity_prelude::CreateMessage;
use poise::serenity_prelude::Http;
use poise::serenity_prelude::UserId as DiscordUserId;

use crate::store::UserId;
use crate::transport::Keyboard;
use crate::transport::Transport;
use crate::transport::error::TransportError;

const IMAGE_FILENAME: &str = "rating.png";

/// Sends DMs through the Discord HTTP API.
///
/// Discord DMs have no reply keyboards, so the options are appended to the
/// message as a line the user can copy.
pub struct DiscordTransport {
    http: Arc<Http>,
}

impl DiscordTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn compose(text: &str, keyboard: &Keyboard) -> String {
        let options: Vec<String> = keyboard
            .rows()
            .into_iter()
            .flatten()
            .map(|label| format!("`{label}`"))
            .collect();
        if options.is_empty() {
            text.to_string()
        } else {
            format!("{text}\n\n{}", options.join(" · "))
        }
    }
}

#[async_trait]
impl Transport for DiscordTransport {
    async fn send_text(
        &self,
        user: UserId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), TransportError> {
        let message = CreateMessage::new().content(Self::compose(text, keyboard));
        DiscordUserId::new(user)
            .dm(&self.http, message)
            .await
            .map(|_| ())
            .map_err(|e| TransportError::SendFailed(Box::new(e)))
    }

    async fn send_image(
        &self,
        user: UserId,
        png: Vec<u8>,
        caption: &str,
    ) -> Result<(), TransportError> {
        let message = CreateMessage::new()
            .content(caption.to_string())
            .add_file(CreateAttachment::bytes(png, IMAGE_FILENAME));
        DiscordUserId::new(user)
            .dm(&self.http, message)
            .await
            .map(|_| ())
            .map_err(|e| TransportError::SendFailed(Box::new(e)))
    }
}
