//! Discord gateway client feeding direct messages into the dialog.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use log::error;
use log::info;
use poise::serenity_prelude::ClientBuilder;
use poise::serenity_prelude::Context;
use poise::serenity_prelude::EventHandler;
use poise::serenity_prelude::FullEvent;
use poise::serenity_prelude::GatewayIntents;
use poise::serenity_prelude::Http;
use poise::serenity_prelude::Token;

use crate::config::Config;
use crate::dialog::Conversation;

/// Discord bot client.
pub struct Bot {
    client_builder: Option<ClientBuilder>,
}

impl Bot {
    pub fn new(config: &Config, conversation: Arc<Conversation>) -> Result<Self> {
        info!("Initializing bot...");

        let token = Self::token(config)?;
        let intents = GatewayIntents::DIRECT_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
        let event_handler = Arc::new(BotEventHandler::new(conversation));
        let client_builder = ClientBuilder::new(token, intents).event_handler(event_handler);

        Ok(Self {
            client_builder: Some(client_builder),
        })
    }

    /// REST client for sending messages outside of gateway events.
    pub fn create_http(config: &Config) -> Result<Arc<Http>> {
        Ok(Arc::new(Http::new(Self::token(config)?)))
    }

    /// Starts the gateway client in a background task.
    pub fn start(&mut self) {
        let Some(client_builder) = self.client_builder.take() else {
            debug!("Bot client already started.");
            return;
        };
        info!("Starting bot client...");

        tokio::spawn(async move {
            info!("Connecting bot to Discord...");
            let mut client = match client_builder.await {
                Ok(client) => client,
                Err(e) => {
                    error!("Failed to build Discord client: {e}");
                    return;
                }
            };
            info!("Bot connected to Discord.");

            if let Err(e) = client.start().await {
                error!("Bot client crashed: {e}");
            }
        });
    }

    fn token(config: &Config) -> Result<Token> {
        Ok(Token::from_str(&config.discord_token)?)
    }
}

/// Routes direct messages from people to the conversation.
pub struct BotEventHandler {
    conversation: Arc<Conversation>,
}

impl BotEventHandler {
    pub fn new(conversation: Arc<Conversation>) -> Self {
        Self { conversation }
    }
}

#[async_trait]
impl EventHandler for BotEventHandler {
    async fn dispatch(&self, _context: &Context, event: &FullEvent) {
        match event {
            FullEvent::Ready { .. } => info!("Bot is ready."),
            FullEvent::Message { new_message, .. } => {
                if new_message.author.bot() || new_message.guild_id.is_some() {
                    return;
                }
                self.conversation
                    .handle_text(new_message.author.id.get(), &new_message.content)
                    .await;
            }
            _ => {}
        }
    }
}
