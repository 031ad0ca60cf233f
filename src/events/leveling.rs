//! XP awards for group chatter.

use teloxide::prelude::*;
use tracing::debug;

use crate::bot::{AppState, ThrottledBot};
use crate::database::models::ChatSettings;
use crate::utils::apply_fillings;

/// XP granted per counted message.
const XP_PER_MESSAGE: u64 = 15;

/// Award xp for a group message and announce level-ups.
///
/// The per-chat cooldown lives on the user record, so rapid messages
/// inside the cooldown window cost nothing and skip the save.
pub async fn award_xp(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    settings: &ChatSettings,
) -> anyhow::Result<()> {
    if !settings.leveling_enabled {
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    if user.is_bot {
        return Ok(());
    }

    let mut record = state.users.get_or_create(user.id.0).await?;
    let xp_before = record.chat_state_ref(msg.chat.id.0).map_or(0, |s| s.xp);
    let new_level = record.add_xp(msg.chat.id.0, XP_PER_MESSAGE);
    let xp_after = record.chat_state_ref(msg.chat.id.0).map_or(0, |s| s.xp);

    // On cooldown: nothing changed, nothing to persist.
    if xp_after == xp_before {
        return Ok(());
    }
    state.users.save(&record).await?;

    if let Some(level) = new_level {
        debug!(
            chat_id = msg.chat.id.0,
            user_id = user.id.0,
            level,
            "level up"
        );
        let text = apply_fillings(
            &settings.level_up_text,
            user,
            msg.chat.title().unwrap_or(""),
            None,
            Some(level),
        );
        bot.send_message(msg.chat.id, text)
            .parse_mode(teloxide::types::ParseMode::Html)
            .await?;
    }
    Ok(())
}
