//! Application entry point for rating-bot.
//!
//! Initializes all components and starts the Discord bot.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dotenv::dotenv;
use log::debug;
use log::info;
use rating_bot::bot::Bot;
use rating_bot::clock::Clock;
use rating_bot::clock::SystemClock;
use rating_bot::config::Config;
use rating_bot::dialog::Conversation;
use rating_bot::logging::setup_logging;
use rating_bot::rating::RatingSource;
use rating_bot::rating::vsuet_source::VsuetSource;
use rating_bot::render::CardRenderer;
use rating_bot::store::UserRecords;
use rating_bot::task;
use rating_bot::task::rating_poller::RatingPoller;
use rating_bot::task::retention_sweeper::RetentionSweeper;
use rating_bot::transport::discord::DiscordTransport;
use rating_bot::transport::notifier::Notifier;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let init_start = Instant::now();
    let config = load_config()?;

    let records = Arc::new(UserRecords::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let source: Arc<dyn RatingSource> = Arc::new(VsuetSource::new(
        config.rating_url.clone(),
        config.min_table_columns,
        config.request_timeout,
    )?);
    let notifier = Notifier::new(
        Arc::new(DiscordTransport::new(Bot::create_http(&config)?)),
        config.reply_timeout,
    );

    let conversation = Arc::new(Conversation::new(
        &config,
        records.clone(),
        source.clone(),
        Arc::new(CardRenderer::new()?),
        notifier.clone(),
        clock.clone(),
    ));
    setup_bot(&config, conversation, init_start)?;

    let token = CancellationToken::new();
    let tasks = setup_tasks(&config, records, source, notifier, clock, &token);

    run(init_start, token, tasks).await
}

fn load_config() -> Result<Config> {
    debug!("Loading configuration...");
    let mut config = Config::new();
    config.load()?;
    setup_logging(&config)?;
    info!("Starting rating-bot...");
    Ok(config)
}

fn setup_bot(config: &Config, conversation: Arc<Conversation>, init_start: Instant) -> Result<()> {
    info!("Starting bot...");
    let mut bot = Bot::new(config, conversation)?;
    bot.start();
    info!(
        "Bot setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn setup_tasks(
    config: &Config,
    records: Arc<UserRecords>,
    source: Arc<dyn RatingSource>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    token: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    debug!("Setting up background tasks...");
    let poller = RatingPoller::new(config, records.clone(), source, notifier, clock.clone());
    let sweeper = RetentionSweeper::new(config, records, clock);
    vec![
        task::spawn(poller, token.child_token()),
        task::spawn(sweeper, token.child_token()),
    ]
}

async fn run(init_start: Instant, token: CancellationToken, tasks: Vec<JoinHandle<()>>) -> Result<()> {
    info!(
        "rating-bot is up in {:.2}s. Press Ctrl+C to stop.",
        init_start.elapsed().as_secs_f64()
    );

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down.");

    token.cancel();
    futures::future::join_all(tasks).await;
    Ok(())
}
