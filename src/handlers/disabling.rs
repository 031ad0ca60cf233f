//! Per-chat command disabling.

use crate::registry::CommandContext;
use crate::utils::html_escape;

// Disabling these would lock admins out of re-enabling anything.
const UNDISABLEABLE: &[&str] = &["disable", "enable", "disabled", "help"];

pub async fn disable(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let trigger = ctx.args.trim().trim_start_matches('/').to_lowercase();
    if trigger.is_empty() {
        ctx.reply("Which command? <code>/disable commandname</code>.")
            .await?;
        return Ok(());
    }

    if UNDISABLEABLE.contains(&trigger.as_str()) {
        ctx.reply(format!(
            "<code>{}</code> can't be disabled.",
            html_escape(&trigger)
        ))
        .await?;
        return Ok(());
    }

    if ctx.state.registry.find(&trigger).is_none() {
        ctx.reply("I don't have a command by that name.").await?;
        return Ok(());
    }

    let mut settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;
    if settings.is_command_disabled(&trigger) {
        ctx.reply(format!(
            "<code>{}</code> is already disabled.",
            html_escape(&trigger)
        ))
        .await?;
        return Ok(());
    }

    settings.disabled_commands.push(trigger.clone());
    settings.touch();
    ctx.state.chats.save(&settings).await?;

    ctx.reply(format!(
        "Disabled <code>{}</code> in this chat.",
        html_escape(&trigger)
    ))
    .await?;
    Ok(())
}

pub async fn enable(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let trigger = ctx.args.trim().trim_start_matches('/').to_lowercase();
    if trigger.is_empty() {
        ctx.reply("Which command? <code>/enable commandname</code>.")
            .await?;
        return Ok(());
    }

    let mut settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;
    let before = settings.disabled_commands.len();
    settings.disabled_commands.retain(|c| c != &trigger);

    if settings.disabled_commands.len() == before {
        ctx.reply(format!(
            "<code>{}</code> isn't disabled.",
            html_escape(&trigger)
        ))
        .await?;
        return Ok(());
    }
    settings.touch();
    ctx.state.chats.save(&settings).await?;

    ctx.reply(format!(
        "Re-enabled <code>{}</code>.",
        html_escape(&trigger)
    ))
    .await?;
    Ok(())
}

pub async fn disabled(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;

    if settings.disabled_commands.is_empty() {
        ctx.reply("Nothing is disabled in this chat.").await?;
        return Ok(());
    }

    let mut text = String::from("Disabled commands:");
    for trigger in &settings.disabled_commands {
        text.push_str(&format!("\n- <code>{}</code>", html_escape(trigger)));
    }
    ctx.reply(text).await?;
    Ok(())
}
