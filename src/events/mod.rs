//! Non-command message pipeline and membership events.

mod filters;
mod flood;
mod leveling;
mod locks;
mod membership;

use std::sync::Arc;

use teloxide::prelude::*;

use crate::bot::{AppState, ThrottledBot};

pub use flood::FloodTracker;
pub use membership::{on_captcha_callback, on_chat_member, spawn_captcha_sweeper};

/// Run ordinary group messages through locks, flood control, filters,
/// and leveling, in that order. A deleted message stops the pipeline.
pub async fn on_message(
    bot: ThrottledBot,
    msg: Message,
    state: Arc<AppState>,
) -> anyhow::Result<()> {
    if !(msg.chat.is_group() || msg.chat.is_supergroup()) {
        return Ok(());
    }

    let settings = state
        .chats
        .get_or_create(msg.chat.id.0, msg.chat.title().unwrap_or(""))
        .await?;

    if locks::enforce_locks(&bot, &msg, &state, &settings).await? {
        return Ok(());
    }
    flood::check_flood(&bot, &msg, &state).await?;
    filters::check_filters(&bot, &msg, &state).await?;
    leveling::award_xp(&bot, &msg, &state, &settings).await?;
    Ok(())
}
