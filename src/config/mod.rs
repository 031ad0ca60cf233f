//! Configuration loaded from environment variables at startup.

use std::env;

use teloxide::types::ChatId;

/// How updates are received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Bot username (without @). Fetched via getMe when unset.
    pub bot_username: Option<String>,

    /// Operator user IDs; these bypass every permission gate.
    pub owner_ids: Vec<u64>,

    /// Chat that receives operator notifications (audit failures etc.).
    pub dev_chat_id: Option<ChatId>,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    /// When set, gates reject instead of failing open on store errors.
    pub strict_gates: bool,
}

impl Config {
    /// Load from the environment.
    ///
    /// # Panics
    /// Panics on a missing required variable; configuration problems are
    /// fatal at startup.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bot_mode = match env::var("BOT_MODE")
            .unwrap_or_else(|_| "polling".to_string())
            .to_lowercase()
            .as_str()
        {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = env::var("WEBHOOK_URL").ok();
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            panic!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        let owner_ids = env::var("OWNER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        let bot_username = env::var("BOT_USERNAME")
            .ok()
            .map(|s| s.trim_start_matches('@').to_string())
            .filter(|s| !s.is_empty());

        let dev_chat_id = env::var("DEV_CHAT_ID")
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(ChatId);

        Self {
            bot_token: env::var("BOT_TOKEN").expect("BOT_TOKEN must be set"),
            bot_mode,
            webhook_url,
            webhook_port: env_parse("WEBHOOK_PORT", 8443),
            webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            bot_username,
            owner_ids,
            dev_chat_id,
            mongodb_uri: env::var("MONGODB_URI").expect("MONGODB_URI must be set"),
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "vigil".to_string()),
            strict_gates: env_flag("STRICT_GATES"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(name: &str) -> bool {
    matches!(
        env::var(name).unwrap_or_default().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
