//! Global user record with embedded per-chat moderation state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use teloxide::types::User;

/// XP cooldown between awards for the same user in the same chat.
pub const XP_COOLDOWN_SECS: i64 = 60;

/// Per-chat mutable state for a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserChatState {
    #[serde(default)]
    pub approved: bool,

    // Warnings
    #[serde(default)]
    pub warnings: u32,
    #[serde(default)]
    pub warn_reasons: Vec<String>,
    #[serde(default)]
    pub last_warn: Option<i64>,

    // Flood tracking (persisted snapshot; the hot path lives in memory)
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub flood_start: Option<i64>,

    // Leveling
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub last_xp: Option<i64>,

    // Economy
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub bank: i64,
}

/// Level derived from xp: `floor(sqrt(xp / 100))`.
pub fn level_from_xp(xp: u64) -> u32 {
    ((xp as f64 / 100.0).sqrt()).floor() as u32
}

/// Minimum xp needed to hold `level`.
pub fn xp_for_level(level: u32) -> u64 {
    (level as u64) * (level as u64) * 100
}

/// User document, one per user across all chats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Telegram user ID (indexed).
    pub user_id: u64,
    /// Username, lowercased for matching.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,

    /// Per-chat state keyed by the chat id rendered as a string
    /// (BSON map keys must be strings).
    #[serde(default)]
    pub chats: HashMap<String, UserChatState>,

    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_language() -> String {
    "en".to_string()
}

impl UserRecord {
    pub fn new(user_id: u64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            user_id,
            username: None,
            first_name: String::new(),
            last_name: None,
            language: default_language(),
            chats: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_telegram(user: &User) -> Self {
        let mut record = Self::new(user.id.0);
        record.sync_identity(user);
        record
    }

    /// Refresh identity fields from a Telegram user. Returns true if
    /// anything changed.
    pub fn sync_identity(&mut self, user: &User) -> bool {
        let username = user.username.as_ref().map(|u| u.to_lowercase());
        let changed = self.username != username
            || self.first_name != user.first_name
            || self.last_name != user.last_name;
        if changed {
            self.username = username;
            self.first_name = user.first_name.clone();
            self.last_name = user.last_name.clone();
            self.touch();
        }
        changed
    }

    /// Per-chat state, created lazily on first access.
    pub fn chat_state(&mut self, chat_id: i64) -> &mut UserChatState {
        self.chats.entry(chat_id.to_string()).or_default()
    }

    /// Read-only per-chat state, if it exists.
    pub fn chat_state_ref(&self, chat_id: i64) -> Option<&UserChatState> {
        self.chats.get(&chat_id.to_string())
    }

    /// Add a warning; returns the new count.
    pub fn add_warning(&mut self, chat_id: i64, reason: &str) -> u32 {
        let state = self.chat_state(chat_id);
        state.warnings += 1;
        state.warn_reasons.push(reason.to_string());
        state.last_warn = Some(chrono::Utc::now().timestamp());
        let count = state.warnings;
        self.touch();
        count
    }

    /// Remove the most recent warning. No-op at zero; returns whether a
    /// warning was removed.
    pub fn remove_warning(&mut self, chat_id: i64) -> bool {
        let state = self.chat_state(chat_id);
        if state.warnings == 0 {
            return false;
        }
        state.warnings -= 1;
        state.warn_reasons.pop();
        self.touch();
        true
    }

    pub fn reset_warnings(&mut self, chat_id: i64) {
        let state = self.chat_state(chat_id);
        state.warnings = 0;
        state.warn_reasons.clear();
        state.last_warn = None;
        self.touch();
    }

    pub fn set_approved(&mut self, chat_id: i64, approved: bool) {
        self.chat_state(chat_id).approved = approved;
        self.touch();
    }

    /// Award xp, honoring the per-chat cooldown. Returns the new level if
    /// the user leveled up.
    pub fn add_xp(&mut self, chat_id: i64, amount: u64) -> Option<u32> {
        let now = chrono::Utc::now().timestamp();
        let state = self.chat_state(chat_id);

        if let Some(last) = state.last_xp {
            if now - last < XP_COOLDOWN_SECS {
                return None;
            }
        }

        state.xp += amount;
        state.last_xp = Some(now);

        let new_level = level_from_xp(state.xp);
        let leveled_up = new_level > state.level;
        state.level = new_level;
        self.touch();

        leveled_up.then_some(new_level)
    }

    pub fn display_name(&self) -> String {
        if let Some(username) = &self.username {
            return format!("@{}", username);
        }
        if !self.first_name.is_empty() {
            return self.first_name.clone();
        }
        format!("User {}", self.user_id)
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_curve_matches_inverse() {
        assert_eq!(level_from_xp(0), 0);
        assert_eq!(level_from_xp(99), 0);
        assert_eq!(level_from_xp(100), 1);
        assert_eq!(level_from_xp(399), 1);
        assert_eq!(level_from_xp(400), 2);
        for level in 0..50u32 {
            assert_eq!(level_from_xp(xp_for_level(level)), level);
            if level > 0 {
                assert_eq!(level_from_xp(xp_for_level(level) - 1), level - 1);
            }
        }
    }

    #[test]
    fn level_is_monotonic_in_xp() {
        let mut prev = 0;
        for xp in (0..10_000).step_by(37) {
            let level = level_from_xp(xp);
            assert!(level >= prev);
            prev = level;
        }
    }

    #[test]
    fn warnings_never_underflow() {
        let mut record = UserRecord::new(42);
        assert!(!record.remove_warning(-100));
        assert_eq!(record.chat_state(-100).warnings, 0);

        record.add_warning(-100, "spam");
        record.add_warning(-100, "more spam");
        assert_eq!(record.chat_state(-100).warnings, 2);

        assert!(record.remove_warning(-100));
        assert!(record.remove_warning(-100));
        assert!(!record.remove_warning(-100));
        assert_eq!(record.chat_state(-100).warnings, 0);
        assert!(record.chat_state(-100).warn_reasons.is_empty());
    }

    #[test]
    fn warnings_are_per_chat() {
        let mut record = UserRecord::new(42);
        record.add_warning(-1, "a");
        record.add_warning(-2, "b");
        record.add_warning(-2, "c");
        assert_eq!(record.chat_state(-1).warnings, 1);
        assert_eq!(record.chat_state(-2).warnings, 2);
    }

    #[test]
    fn xp_cooldown_blocks_rapid_awards() {
        let mut record = UserRecord::new(42);
        // First award goes through.
        assert!(record.add_xp(-100, 150).is_some()); // level 0 -> 1
        let xp_after_first = record.chat_state(-100).xp;
        // Second immediate award is swallowed by the cooldown.
        assert!(record.add_xp(-100, 500).is_none());
        assert_eq!(record.chat_state(-100).xp, xp_after_first);
    }

    #[test]
    fn xp_award_reports_level_up_only_on_boundary() {
        let mut record = UserRecord::new(42);
        let state = record.chat_state(-100);
        state.xp = 90;
        state.level = 0;
        state.last_xp = None;
        assert_eq!(record.add_xp(-100, 10), Some(1)); // 100 xp -> level 1

        let state = record.chat_state(-100);
        state.last_xp = None;
        assert_eq!(record.add_xp(-100, 1), None); // 101 xp, still level 1
    }
}
