//! Webhook mode via teloxide's axum listener.
//!
//! Registers the webhook with Telegram, serves updates over HTTP, and
//! deletes the webhook again on shutdown.

use std::net::SocketAddr;

use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::info;
use url::Url;

use super::dispatcher::ThrottledBot;
use crate::config::Config;

pub async fn start_webhook(
    config: &Config,
    mut dispatcher: Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>,
    bot: ThrottledBot,
) {
    let webhook_url = config
        .webhook_url
        .as_ref()
        .expect("WEBHOOK_URL must be set when using webhook mode");
    let url = Url::parse(webhook_url).expect("invalid WEBHOOK_URL");

    let address = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));
    let mut options = Options::new(address, url.clone());
    if let Some(secret) = &config.webhook_secret {
        options = options.secret_token(secret.clone());
    }

    info!(%url, %address, "setting webhook");

    // Webhook registration only needs the plain Bot underneath the
    // throttle adaptor.
    let listener = webhooks::axum(bot.inner().clone(), options)
        .await
        .expect("failed to set up webhook");

    let error_handler = LoggingErrorHandler::with_custom_text("error from update listener");
    dispatcher
        .dispatch_with_listener(listener, error_handler)
        .await;
}
