//! Per-chat settings document.
//!
//! One document per chat, created lazily on first access. Every field has
//! a serde default so documents written by older versions deserialize
//! cleanly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Content lock kinds a chat can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockKind {
    Sticker,
    Animation,
    Media,
    Url,
    Button,
    Forward,
    Document,
    Photo,
    Video,
    Audio,
    Voice,
    Contact,
    Location,
    Rtl,
    Email,
    Phone,
    Bot,
    Inline,
    Game,
    Poll,
    Dice,
}

impl LockKind {
    pub const ALL: [LockKind; 21] = [
        LockKind::Sticker,
        LockKind::Animation,
        LockKind::Media,
        LockKind::Url,
        LockKind::Button,
        LockKind::Forward,
        LockKind::Document,
        LockKind::Photo,
        LockKind::Video,
        LockKind::Audio,
        LockKind::Voice,
        LockKind::Contact,
        LockKind::Location,
        LockKind::Rtl,
        LockKind::Email,
        LockKind::Phone,
        LockKind::Bot,
        LockKind::Inline,
        LockKind::Game,
        LockKind::Poll,
        LockKind::Dice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LockKind::Sticker => "sticker",
            LockKind::Animation => "animation",
            LockKind::Media => "media",
            LockKind::Url => "url",
            LockKind::Button => "button",
            LockKind::Forward => "forward",
            LockKind::Document => "document",
            LockKind::Photo => "photo",
            LockKind::Video => "video",
            LockKind::Audio => "audio",
            LockKind::Voice => "voice",
            LockKind::Contact => "contact",
            LockKind::Location => "location",
            LockKind::Rtl => "rtl",
            LockKind::Email => "email",
            LockKind::Phone => "phone",
            LockKind::Bot => "bot",
            LockKind::Inline => "inline",
            LockKind::Game => "game",
            LockKind::Poll => "poll",
            LockKind::Dice => "dice",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s.to_lowercase())
    }
}

/// Punishment applied when a limit (warns, flood) is exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PunishMode {
    #[default]
    Ban,
    Mute,
    Kick,
    Warn,
    Nothing,
}

impl PunishMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ban" => Some(Self::Ban),
            "mute" => Some(Self::Mute),
            "kick" => Some(Self::Kick),
            "warn" => Some(Self::Warn),
            "nothing" => Some(Self::Nothing),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Mute => "mute",
            Self::Kick => "kick",
            Self::Warn => "warn",
            Self::Nothing => "nothing",
        }
    }
}

/// Captcha presentation mode. Only `Button` is enforced by this bot;
/// image/math rendering is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptchaMode {
    #[default]
    Button,
    Math,
    Text,
}

/// Settings document, one per chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Telegram chat ID (indexed).
    pub chat_id: i64,
    #[serde(default = "default_chat_type")]
    pub chat_type: String,
    #[serde(default = "default_title")]
    pub title: String,

    // Antiflood
    #[serde(default = "default_flood_limit")]
    pub flood_limit: u32,
    #[serde(default)]
    pub flood_mode: PunishMode,
    #[serde(default = "default_flood_window")]
    pub flood_window_secs: u32,

    // Antiraid
    #[serde(default)]
    pub antiraid_enabled: bool,
    #[serde(default = "default_antiraid_duration")]
    pub antiraid_duration_secs: u64,

    // Locks
    #[serde(default)]
    pub locks: HashMap<String, bool>,

    // Captcha
    #[serde(default)]
    pub captcha_enabled: bool,
    #[serde(default)]
    pub captcha_mode: CaptchaMode,
    #[serde(default = "default_captcha_timeout")]
    pub captcha_timeout_secs: u64,

    // Greetings
    #[serde(default = "default_true")]
    pub welcome_enabled: bool,
    #[serde(default = "default_welcome_text")]
    pub welcome_text: String,
    #[serde(default)]
    pub goodbye_enabled: bool,
    #[serde(default = "default_goodbye_text")]
    pub goodbye_text: String,

    // Warnings
    #[serde(default)]
    pub warn_mode: PunishMode,
    #[serde(default = "default_warn_limit")]
    pub warn_limit: u32,
    /// Warn expiry in seconds; 0 means warnings never expire.
    #[serde(default)]
    pub warn_time_secs: u64,

    // Federation linkage
    #[serde(default)]
    pub fed_id: Option<String>,
    #[serde(default)]
    pub quiet_fed: bool,

    // Logging
    #[serde(default)]
    pub log_channel_id: Option<i64>,
    #[serde(default)]
    pub log_categories: Vec<String>,

    // Language
    #[serde(default = "default_language")]
    pub language: String,

    // Reports
    #[serde(default = "default_true")]
    pub reports_enabled: bool,

    // Command disabling
    #[serde(default)]
    pub disabled_commands: Vec<String>,

    // Leveling
    #[serde(default)]
    pub leveling_enabled: bool,
    #[serde(default = "default_level_up_text")]
    pub level_up_text: String,

    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_chat_type() -> String {
    "supergroup".to_string()
}

fn default_title() -> String {
    "Unknown".to_string()
}

fn default_flood_limit() -> u32 {
    10
}

fn default_flood_window() -> u32 {
    30
}

fn default_antiraid_duration() -> u64 {
    21_600 // 6 hours
}

fn default_captcha_timeout() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_welcome_text() -> String {
    "Welcome {mention}!".to_string()
}

fn default_goodbye_text() -> String {
    "Goodbye {first}!".to_string()
}

fn default_warn_limit() -> u32 {
    3
}

fn default_language() -> String {
    "en".to_string()
}

fn default_level_up_text() -> String {
    "Congrats {mention}, you reached level {level}!".to_string()
}

impl ChatSettings {
    pub fn new(chat_id: i64, chat_type: &str, title: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            chat_id,
            chat_type: chat_type.to_string(),
            title: title.to_string(),
            flood_limit: default_flood_limit(),
            flood_mode: PunishMode::Mute,
            flood_window_secs: default_flood_window(),
            antiraid_enabled: false,
            antiraid_duration_secs: default_antiraid_duration(),
            locks: LockKind::ALL
                .iter()
                .map(|k| (k.as_str().to_string(), false))
                .collect(),
            captcha_enabled: false,
            captcha_mode: CaptchaMode::default(),
            captcha_timeout_secs: default_captcha_timeout(),
            welcome_enabled: true,
            welcome_text: default_welcome_text(),
            goodbye_enabled: false,
            goodbye_text: default_goodbye_text(),
            warn_mode: PunishMode::Ban,
            warn_limit: default_warn_limit(),
            warn_time_secs: 0,
            fed_id: None,
            quiet_fed: false,
            log_channel_id: None,
            log_categories: Vec::new(),
            language: default_language(),
            reports_enabled: true,
            disabled_commands: Vec::new(),
            leveling_enabled: false,
            level_up_text: default_level_up_text(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a lock kind is currently enabled.
    pub fn is_locked(&self, kind: LockKind) -> bool {
        self.locks.get(kind.as_str()).copied().unwrap_or(false)
    }

    pub fn set_lock(&mut self, kind: LockKind, locked: bool) {
        self.locks.insert(kind.as_str().to_string(), locked);
        self.touch();
    }

    pub fn is_command_disabled(&self, trigger: &str) -> bool {
        self.disabled_commands.iter().any(|c| c == trigger)
    }

    /// Named feature flags consulted before feature-gated commands run.
    /// Unknown names count as enabled.
    pub fn feature_enabled(&self, name: &str) -> bool {
        match name {
            "reports" => self.reports_enabled,
            "leveling" => self.leveling_enabled,
            "welcome" => self.welcome_enabled,
            "goodbye" => self.goodbye_enabled,
            "captcha" => self.captcha_enabled,
            "antiraid" => self.antiraid_enabled,
            _ => true,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_lock_kinds() {
        let settings = ChatSettings::new(-100, "supergroup", "Test");
        assert_eq!(settings.locks.len(), 21);
        assert!(LockKind::ALL.iter().all(|k| !settings.is_locked(*k)));
    }

    #[test]
    fn lock_roundtrip() {
        let mut settings = ChatSettings::new(-100, "supergroup", "Test");
        settings.set_lock(LockKind::Url, true);
        assert!(settings.is_locked(LockKind::Url));
        assert!(!settings.is_locked(LockKind::Sticker));
        settings.set_lock(LockKind::Url, false);
        assert!(!settings.is_locked(LockKind::Url));
    }

    #[test]
    fn lock_kind_parse() {
        assert_eq!(LockKind::parse("URL"), Some(LockKind::Url));
        assert_eq!(LockKind::parse("sticker"), Some(LockKind::Sticker));
        assert_eq!(LockKind::parse("nope"), None);
    }

    #[test]
    fn empty_document_deserializes_with_defaults() {
        let settings: ChatSettings =
            mongodb::bson::from_document(mongodb::bson::doc! { "chat_id": -1i64 }).unwrap();
        assert_eq!(settings.flood_limit, 10);
        assert_eq!(settings.warn_limit, 3);
        assert_eq!(settings.warn_mode, PunishMode::Ban);
        assert!(settings.welcome_enabled);
        assert_eq!(settings.language, "en");
    }
}
