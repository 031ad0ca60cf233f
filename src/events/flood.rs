//! Flood control over group messages.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use teloxide::prelude::*;
use teloxide::types::ChatPermissions;
use tracing::{debug, info, warn};

use crate::bot::{AppState, ThrottledBot};
use crate::database::models::{ActionKind, ActionLogEntry, PunishMode};
use crate::utils::html_escape;

/// Mute length applied when the flood punishment is a mute.
const FLOOD_MUTE_SECS: i64 = 3600;

/// In-memory sliding windows of message times per (chat, user).
///
/// This is hot-path state; the per-user counters in the user document
/// are only a persisted snapshot.
#[derive(Debug, Default)]
pub struct FloodTracker {
    windows: DashMap<(i64, u64), Vec<Instant>>,
}

impl FloodTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one message; returns true when the user exceeded `limit`
    /// messages inside the window.
    pub fn record(&self, chat_id: i64, user_id: u64, limit: u32, window_secs: u32) -> bool {
        self.record_at(chat_id, user_id, limit, window_secs, Instant::now())
    }

    fn record_at(
        &self,
        chat_id: i64,
        user_id: u64,
        limit: u32,
        window_secs: u32,
        now: Instant,
    ) -> bool {
        let window = Duration::from_secs(window_secs as u64);
        let mut times = self.windows.entry((chat_id, user_id)).or_default();
        times.retain(|t| now.duration_since(*t) < window);
        times.push(now);
        times.len() > limit as usize
    }

    /// Forget a user's window, e.g. after a penalty.
    pub fn reset(&self, chat_id: i64, user_id: u64) {
        self.windows.remove(&(chat_id, user_id));
    }
}

/// Check one group message against the chat's flood settings and punish
/// per the chat's flood mode.
pub async fn check_flood(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    if user.is_bot {
        return Ok(());
    }

    let settings = state.chats.get_or_create(chat_id.0, msg.chat.title().unwrap_or("")).await?;
    if settings.flood_limit == 0 {
        return Ok(());
    }

    // Operators, admins, and approved users are exempt.
    if state.is_operator(user.id.0) {
        return Ok(());
    }
    if state
        .permissions
        .is_admin(chat_id, user.id)
        .await
        .unwrap_or(false)
    {
        return Ok(());
    }
    if let Ok(Some(record)) = state.users.get_by_id(user.id.0).await
        && record
            .chat_state_ref(chat_id.0)
            .is_some_and(|s| s.approved)
    {
        return Ok(());
    }

    let flooding = state.flood.record(
        chat_id.0,
        user.id.0,
        settings.flood_limit,
        settings.flood_window_secs,
    );
    if !flooding {
        return Ok(());
    }

    debug!(chat_id = chat_id.0, user_id = user.id.0, "flood detected");
    state.flood.reset(chat_id.0, user.id.0);

    let mention = crate::utils::mention(user.id.0, &user.first_name);
    let outcome = match settings.flood_mode {
        PunishMode::Ban => {
            bot.ban_chat_member(chat_id, user.id).await?;
            format!("{mention} was banned for flooding.")
        }
        PunishMode::Mute => {
            let until = chrono::Utc::now() + chrono::Duration::seconds(FLOOD_MUTE_SECS);
            bot.restrict_chat_member(chat_id, user.id, ChatPermissions::empty())
                .until_date(until)
                .await?;
            format!("{mention} was muted for flooding.")
        }
        PunishMode::Kick => {
            bot.ban_chat_member(chat_id, user.id).await?;
            let _ = bot.unban_chat_member(chat_id, user.id).await;
            format!("{mention} was kicked for flooding.")
        }
        PunishMode::Warn => {
            let mut record = state.users.get_or_create(user.id.0).await?;
            let count = record.add_warning(chat_id.0, "Flooding");
            state.users.save(&record).await?;
            format!(
                "{mention} was warned for flooding ({count}/{}).",
                settings.warn_limit
            )
        }
        PunishMode::Nothing => {
            format!("Easy there, {}.", html_escape(&user.first_name))
        }
    };

    info!(
        chat_id = chat_id.0,
        user_id = user.id.0,
        mode = settings.flood_mode.as_str(),
        "flood penalty applied"
    );
    state
        .audit
        .record(
            ActionLogEntry::new(chat_id.0, ActionKind::Flood, user.id.0)
                .target(user.id.0)
                .meta(mongodb::bson::doc! {
                    "mode": settings.flood_mode.as_str(),
                    "limit": settings.flood_limit as i32,
                }),
        )
        .await;

    if let Err(e) = bot
        .send_message(chat_id, outcome)
        .parse_mode(teloxide::types::ParseMode::Html)
        .await
    {
        warn!(chat_id = chat_id.0, "failed to announce flood penalty: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_the_limit_is_quiet() {
        let tracker = FloodTracker::new();
        let now = Instant::now();
        for _ in 0..10 {
            assert!(!tracker.record_at(-1, 7, 10, 30, now));
        }
    }

    #[test]
    fn exceeding_the_limit_trips() {
        let tracker = FloodTracker::new();
        let now = Instant::now();
        for _ in 0..10 {
            tracker.record_at(-1, 7, 10, 30, now);
        }
        assert!(tracker.record_at(-1, 7, 10, 30, now));
    }

    #[test]
    fn old_messages_age_out() {
        let tracker = FloodTracker::new();
        let start = Instant::now();
        for _ in 0..10 {
            tracker.record_at(-1, 7, 10, 30, start);
        }
        // Window has rolled past; fresh messages start a new count.
        assert!(!tracker.record_at(-1, 7, 10, 30, start + Duration::from_secs(31)));
    }

    #[test]
    fn reset_clears_the_window() {
        let tracker = FloodTracker::new();
        let now = Instant::now();
        for _ in 0..10 {
            tracker.record_at(-1, 7, 10, 30, now);
        }
        tracker.reset(-1, 7);
        assert!(!tracker.record_at(-1, 7, 10, 30, now));
    }

    #[test]
    fn chats_do_not_share_windows() {
        let tracker = FloodTracker::new();
        let now = Instant::now();
        for _ in 0..10 {
            tracker.record_at(-1, 7, 10, 30, now);
        }
        assert!(!tracker.record_at(-2, 7, 10, 30, now));
    }
}
