//! Small informational commands.

use crate::database::models::PunishMode;
use crate::registry::CommandContext;
use crate::utils::html_escape;

pub async fn id(ctx: CommandContext) -> anyhow::Result<()> {
    let mut text = format!("Chat ID: <code>{}</code>", ctx.chat_id().0);
    if let Some(reply) = ctx.msg.reply_to_message()
        && let Some(from) = reply.from.as_ref()
    {
        text.push_str(&format!(
            "\n{}'s ID: <code>{}</code>",
            html_escape(&from.first_name),
            from.id.0
        ));
    } else if let Some(sender) = ctx.sender() {
        text.push_str(&format!("\nYour ID: <code>{}</code>", sender.id.0));
    }
    ctx.reply(text).await?;
    Ok(())
}

pub async fn info(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();

    // Without a target, show the sender.
    let target_id = if ctx.args.trim().is_empty() && ctx.msg.reply_to_message().is_none() {
        match ctx.sender() {
            Some(user) => user.id.0,
            None => return Ok(()),
        }
    } else {
        match super::common::require_target(&ctx).await? {
            Some((id, _)) => id.0,
            None => return Ok(()),
        }
    };

    let Some(record) = ctx.state.users.get_by_id(target_id).await? else {
        ctx.reply("I haven't seen that user yet.").await?;
        return Ok(());
    };

    let mut text = format!(
        "<b>{}</b>\nID: <code>{}</code>",
        html_escape(&record.display_name()),
        record.user_id
    );
    if let Some(state) = record.chat_state_ref(chat_id.0) {
        text.push_str(&format!(
            "\nWarnings: {}\nApproved: {}\nLevel: {} ({} xp)",
            state.warnings,
            if state.approved { "yes" } else { "no" },
            state.level,
            state.xp
        ));
    }
    ctx.reply(text).await?;
    Ok(())
}

pub async fn settings(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let s = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;

    let locked: Vec<&str> = s
        .locks
        .iter()
        .filter(|(_, v)| **v)
        .map(|(k, _)| k.as_str())
        .collect();

    let text = format!(
        "<b>Settings for {}</b>\n\
         Warn limit: {} (mode: {})\n\
         Flood limit: {} msgs / {}s (mode: {})\n\
         Captcha: {} (timeout {}s)\n\
         Welcome: {} | Goodbye: {}\n\
         Leveling: {} | Reports: {}\n\
         Federation: {}\n\
         Locks: {}\n\
         Disabled commands: {}",
        html_escape(&s.title),
        s.warn_limit,
        s.warn_mode.as_str(),
        s.flood_limit,
        s.flood_window_secs,
        s.flood_mode.as_str(),
        onoff(s.captcha_enabled),
        s.captcha_timeout_secs,
        onoff(s.welcome_enabled),
        onoff(s.goodbye_enabled),
        onoff(s.leveling_enabled),
        onoff(s.reports_enabled),
        s.fed_id.as_deref().unwrap_or("none"),
        if locked.is_empty() {
            "none".to_string()
        } else {
            locked.join(", ")
        },
        if s.disabled_commands.is_empty() {
            "none".to_string()
        } else {
            s.disabled_commands.join(", ")
        },
    );
    ctx.reply(text).await?;
    Ok(())
}

/// Show the audit trail: chat-wide, or filtered to a target user.
pub async fn actionlog(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();

    let entries = if ctx.args.trim().is_empty() && ctx.msg.reply_to_message().is_none() {
        ctx.state.logs.recent(chat_id.0, 10).await?
    } else {
        match super::common::require_target(&ctx).await? {
            Some((id, _)) => ctx.state.logs.for_user(chat_id.0, id.0, 10).await?,
            None => return Ok(()),
        }
    };

    if entries.is_empty() {
        ctx.reply("No moderation actions recorded here yet.").await?;
        return Ok(());
    }

    let mut text = String::from("Recent moderation actions:");
    for entry in &entries {
        let when = chrono::DateTime::from_timestamp(entry.timestamp, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| entry.timestamp.to_string());
        text.push_str(&format!("\n{when} — <b>{}</b>", entry.action.as_str()));
        if let Some(target) = entry.target_user {
            text.push_str(&format!(" on <code>{target}</code>"));
        }
        if let Some(reason) = &entry.reason {
            text.push_str(&format!(" ({})", html_escape(reason)));
        }
    }
    ctx.reply(text).await?;
    Ok(())
}

fn onoff(b: bool) -> &'static str {
    if b {
        "on"
    } else {
        "off"
    }
}

pub async fn start(ctx: CommandContext) -> anyhow::Result<()> {
    ctx.reply(
        "Hi! I keep group chats tidy: bans, mutes, warnings, flood control, \
         locks, filters, notes, federations and more.\n\
         Add me to a group and promote me, then use /help to see what I can do.",
    )
    .await?;
    Ok(())
}

pub async fn setflood(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let mut settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;

    let arg = ctx.args.trim();
    if arg.is_empty() {
        ctx.reply(format!(
            "Flood limit is {} messages per {}s. Set it with <code>/setflood 10</code>, or 0 to turn it off.",
            settings.flood_limit, settings.flood_window_secs
        ))
        .await?;
        return Ok(());
    }

    match arg.parse::<u32>() {
        Ok(limit) if limit <= 1000 => {
            settings.flood_limit = limit;
            settings.touch();
            ctx.state.chats.save(&settings).await?;
            if limit == 0 {
                ctx.reply("Flood control turned off.").await?;
            } else {
                ctx.reply(format!("Flood limit set to {limit} messages.")).await?;
            }
        }
        _ => {
            ctx.reply("Give me a number between 0 and 1000.").await?;
        }
    }
    Ok(())
}

pub async fn floodmode(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let mut settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;

    let arg = ctx.args.trim();
    if arg.is_empty() {
        ctx.reply(format!(
            "The flood mode here is <b>{}</b>. Options: ban, mute, kick, nothing.",
            settings.flood_mode.as_str()
        ))
        .await?;
        return Ok(());
    }

    match PunishMode::parse(arg) {
        Some(mode) => {
            settings.flood_mode = mode;
            settings.touch();
            ctx.state.chats.save(&settings).await?;
            ctx.reply(format!("Flood mode set to <b>{}</b>.", mode.as_str()))
                .await?;
        }
        None => {
            ctx.reply("I don't know that mode. Options: ban, mute, kick, nothing.")
                .await?;
        }
    }
    Ok(())
}
