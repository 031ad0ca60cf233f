//! Polling and webhook runners.

use teloxide::prelude::*;
use tracing::info;

use super::dispatcher::ThrottledBot;
use crate::config::{BotMode, Config};

/// Run the dispatcher in the configured mode until shutdown.
pub async fn run(
    config: &Config,
    bot: ThrottledBot,
    mut dispatcher: Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>,
) {
    match config.bot_mode {
        BotMode::Polling => {
            info!("starting in polling mode");
            dispatcher.dispatch().await;
        }
        BotMode::Webhook => {
            info!("starting in webhook mode");
            super::webhook::start_webhook(config, dispatcher, bot).await;
        }
    }
}
