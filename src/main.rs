//! Vigil, a Telegram group-moderation bot.
//!
//! - `config` - environment configuration
//! - `database` - MongoDB models and repositories
//! - `cache` - typed moka caches behind a registry
//! - `permissions` - cached admin-status checks
//! - `gates` - pre-handler policy chain
//! - `registry` - command specs and dispatch metadata
//! - `handlers` - command bodies
//! - `events` - non-command message pipeline and membership events
//! - `bot` - dispatcher schema and polling/webhook runtime

mod audit;
mod bot;
mod cache;
mod config;
mod database;
mod events;
mod gates;
mod handlers;
mod permissions;
mod registry;
mod resolver;
mod utils;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cache::CacheRegistry;
use crate::config::Config;
use crate::database::Database;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vigil=info,teloxide=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Arc::new(Config::from_env());
    info!(mode = ?config.bot_mode, "configuration loaded");

    let db = Arc::new(Database::connect(&config.mongodb_uri, &config.mongodb_database).await?);
    info!(database = %config.mongodb_database, "database connected");

    let cache = Arc::new(CacheRegistry::new());

    // Throttle keeps us inside Telegram's per-chat and global send limits.
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    let me = bot.get_me().await?;
    let bot_username = config
        .bot_username
        .clone()
        .unwrap_or_else(|| me.username().to_string());
    info!(username = %bot_username, "bot identity confirmed");

    if config.owner_ids.is_empty() {
        info!("no operator IDs configured");
    } else {
        info!(operators = ?config.owner_ids, "operators loaded");
    }

    let registry = handlers::build_registry()?;
    info!(commands = registry.len(), "command registry built");

    let state = Arc::new(bot::AppState::new(
        bot.clone(),
        me.id,
        db,
        cache,
        config.clone(),
        registry,
        bot_username,
    ));

    events::spawn_captcha_sweeper(bot.clone(), state.clone());
    spawn_limiter_sweeper(state.clone());

    let dispatcher = bot::build_dispatcher(bot.clone(), state);
    bot::run(&config, bot, dispatcher).await;

    Ok(())
}

/// Periodically drop fully-aged rate-limit windows so the map doesn't
/// grow with every user ever seen.
fn spawn_limiter_sweeper(state: Arc<bot::AppState>) {
    use std::time::Duration;

    const SWEEP_EVERY: Duration = Duration::from_secs(600);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_EVERY);
        loop {
            ticker.tick().await;
            state.limiter.sweep(SWEEP_EVERY);
        }
    });
}
