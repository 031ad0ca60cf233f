//! Membership events: greetings and captcha-gated entry.

use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, ChatMemberUpdated, ChatPermissions, InlineKeyboardButton,
    InlineKeyboardMarkup, MessageId, ParseMode, User,
};
use tracing::{info, warn};

use crate::bot::{AppState, ThrottledBot};
use crate::database::models::{
    ActionKind, ActionLogEntry, CaptchaMode, ChatSettings, PendingCaptcha,
};
use crate::utils::apply_fillings;

/// How often the sweeper looks for expired pending captchas.
const SWEEP_INTERVAL_SECS: u64 = 30;

/// React to a member joining or leaving.
pub async fn on_chat_member(
    bot: ThrottledBot,
    upd: ChatMemberUpdated,
    state: Arc<AppState>,
) -> anyhow::Result<()> {
    let was_present = upd.old_chat_member.is_present();
    let is_present = upd.new_chat_member.is_present();
    let user = &upd.new_chat_member.user;

    if !was_present && is_present {
        if user.is_bot {
            return Ok(());
        }
        let settings = state
            .chats
            .get_or_create(upd.chat.id.0, upd.chat.title().unwrap_or(""))
            .await?;
        if settings.captcha_enabled && settings.captcha_mode == CaptchaMode::Button {
            gate_new_member(&bot, &upd, user, &state, &settings).await?;
        } else if settings.welcome_enabled {
            send_greeting(&bot, upd.chat.id, user, &settings, &settings.welcome_text).await;
        }
    } else if was_present && !is_present {
        let settings = state
            .chats
            .get_or_create(upd.chat.id.0, upd.chat.title().unwrap_or(""))
            .await?;
        if settings.goodbye_enabled {
            send_greeting(&bot, upd.chat.id, user, &settings, &settings.goodbye_text).await;
        }
        // A pending member who left before verifying needs no sweep.
        let _ = state.captcha.remove(upd.chat.id.0, user.id.0).await;
    }
    Ok(())
}

/// Mute the newcomer and post the verify button.
async fn gate_new_member(
    bot: &ThrottledBot,
    upd: &ChatMemberUpdated,
    user: &User,
    state: &Arc<AppState>,
    settings: &ChatSettings,
) -> anyhow::Result<()> {
    let chat_id = upd.chat.id;
    bot.restrict_chat_member(chat_id, user.id, ChatPermissions::empty())
        .await?;

    let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "I'm human, let me in",
        format!("captcha:{}", user.id.0),
    )]]);
    let prompt = bot
        .send_message(
            chat_id,
            format!(
                "Welcome {}! Press the button within {} to prove you're not a bot.",
                crate::utils::mention(user.id.0, &user.first_name),
                crate::utils::format_duration(settings.captcha_timeout_secs),
            ),
        )
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;

    let mut pending = PendingCaptcha::new(chat_id.0, user.id.0, settings.captcha_timeout_secs);
    pending.prompt_message_id = Some(prompt.id.0);
    state.captcha.add(&pending).await?;

    info!(
        chat_id = chat_id.0,
        user_id = user.id.0,
        timeout_secs = settings.captcha_timeout_secs,
        "captcha gate armed"
    );
    Ok(())
}

/// Handle a press of the verify button. Only the gated member may press
/// their own button.
pub async fn on_captcha_callback(
    bot: &ThrottledBot,
    query: &CallbackQuery,
    state: &Arc<AppState>,
    data: &str,
) -> anyhow::Result<()> {
    let Some(message) = query.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;

    let Ok(gated_user_id) = data.parse::<u64>() else {
        bot.answer_callback_query(query.id.clone()).await?;
        return Ok(());
    };
    if query.from.id.0 != gated_user_id {
        bot.answer_callback_query(query.id.clone())
            .text("This button isn't for you.")
            .show_alert(true)
            .await?;
        return Ok(());
    }

    let Some(pending) = state.captcha.get(chat_id.0, gated_user_id).await? else {
        bot.answer_callback_query(query.id.clone()).await?;
        return Ok(());
    };

    bot.restrict_chat_member(chat_id, query.from.id, ChatPermissions::all())
        .await?;
    state.captcha.remove(chat_id.0, gated_user_id).await?;
    if let Some(prompt_id) = pending.prompt_message_id {
        let _ = bot.delete_message(chat_id, MessageId(prompt_id)).await;
    }
    bot.answer_callback_query(query.id.clone())
        .text("Verified, welcome!")
        .await?;

    info!(chat_id = chat_id.0, user_id = gated_user_id, "captcha passed");

    let settings = state
        .chats
        .get_or_create(chat_id.0, message.chat().title().unwrap_or(""))
        .await?;
    if settings.welcome_enabled {
        send_greeting(bot, chat_id, &query.from, &settings, &settings.welcome_text).await;
    }
    Ok(())
}

/// Kick members whose captcha deadline passed. Runs for the lifetime of
/// the process.
pub fn spawn_captcha_sweeper(bot: ThrottledBot, state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            if let Err(e) = sweep_once(&bot, &state).await {
                warn!("captcha sweep failed: {e:#}");
            }
        }
    });
}

async fn sweep_once(bot: &ThrottledBot, state: &Arc<AppState>) -> anyhow::Result<()> {
    let now = chrono::Utc::now().timestamp();
    for pending in state.captcha.expired(now).await? {
        let chat_id = ChatId(pending.chat_id);
        let user_id = UserId(pending.user_id);

        // Kick, not ban: the member may rejoin and try again.
        if bot.ban_chat_member(chat_id, user_id).await.is_ok() {
            let _ = bot.unban_chat_member(chat_id, user_id).await;
        }
        if let Some(prompt_id) = pending.prompt_message_id {
            let _ = bot.delete_message(chat_id, MessageId(prompt_id)).await;
        }
        state.captcha.remove(pending.chat_id, pending.user_id).await?;

        info!(
            chat_id = pending.chat_id,
            user_id = pending.user_id,
            "captcha timed out, member removed"
        );
        state
            .audit
            .record(
                ActionLogEntry::new(pending.chat_id, ActionKind::Captcha, pending.user_id)
                    .target(pending.user_id)
                    .meta(mongodb::bson::doc! { "outcome": "timeout" }),
            )
            .await;
    }
    Ok(())
}

async fn send_greeting(
    bot: &ThrottledBot,
    chat_id: ChatId,
    user: &User,
    settings: &ChatSettings,
    template: &str,
) {
    let count = bot
        .get_chat_member_count(chat_id)
        .await
        .ok()
        .map(|c| c as u64);
    let text = apply_fillings(template, user, &settings.title, count, None);
    if let Err(e) = bot
        .send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await
    {
        warn!(chat_id = chat_id.0, "failed to send greeting: {e}");
    }
}
