//! Warning commands and limit-triggered punishment.

use mongodb::bson::doc;
use teloxide::prelude::Requester;
use teloxide::types::ChatPermissions;
use tracing::info;

use crate::database::models::{ActionKind, ActionLogEntry, PunishMode};
use crate::registry::CommandContext;
use crate::utils::html_escape;

use super::common::{reason_or_default, require_target, target_is_protected};

pub async fn warn(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };
    if target_is_protected(&ctx, target_id).await? {
        return Ok(());
    }

    let reason = reason_or_default(Some(&target.remainder));

    let settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;

    let mut record = ctx.state.users.get_or_create(target_id.0).await?;
    let count = record.add_warning(chat_id.0, &reason);
    ctx.state.users.save(&record).await?;

    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    ctx.state
        .audit
        .record(
            ActionLogEntry::new(chat_id.0, ActionKind::Warn, performed_by)
                .target(target_id.0)
                .reason(reason.clone())
                .meta(doc! { "count": count as i32, "limit": settings.warn_limit as i32 }),
        )
        .await;

    if count < settings.warn_limit {
        ctx.reply(format!(
            "Warned {} ({count}/{}).\nReason: {}",
            target.user.mention(),
            settings.warn_limit,
            html_escape(&reason)
        ))
        .await?;
        return Ok(());
    }

    // Limit reached: apply the chat's warn punishment and reset.
    record.reset_warnings(chat_id.0);
    ctx.state.users.save(&record).await?;
    info!(
        chat_id = chat_id.0,
        target = target_id.0,
        mode = settings.warn_mode.as_str(),
        "warn limit reached"
    );

    let action = match settings.warn_mode {
        PunishMode::Ban => {
            ctx.bot.ban_chat_member(chat_id, target_id).await?;
            "banned"
        }
        PunishMode::Mute => {
            ctx.bot
                .restrict_chat_member(chat_id, target_id, ChatPermissions::empty())
                .await?;
            "muted"
        }
        PunishMode::Kick => {
            ctx.bot.ban_chat_member(chat_id, target_id).await?;
            ctx.bot.unban_chat_member(chat_id, target_id).await?;
            "kicked"
        }
        PunishMode::Warn | PunishMode::Nothing => "let off with the warnings reset",
    };

    ctx.reply(format!(
        "{} hit the warn limit ({}/{}) and got {action}.",
        target.user.mention(),
        count,
        settings.warn_limit
    ))
    .await?;
    Ok(())
}

pub async fn rmwarn(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };

    let mut record = ctx.state.users.get_or_create(target_id.0).await?;
    let removed = record.remove_warning(chat_id.0);
    if removed {
        ctx.state.users.save(&record).await?;
        let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
        ctx.state
            .audit
            .record(
                ActionLogEntry::new(chat_id.0, ActionKind::Unwarn, performed_by)
                    .target(target_id.0),
            )
            .await;

        let left = record
            .chat_state_ref(chat_id.0)
            .map(|s| s.warnings)
            .unwrap_or(0);
        ctx.reply(format!(
            "Removed a warning from {} ({left} left).",
            target.user.mention()
        ))
        .await?;
    } else {
        ctx.reply(format!("{} has no warnings.", target.user.mention()))
            .await?;
    }
    Ok(())
}

pub async fn resetwarns(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };

    let mut record = ctx.state.users.get_or_create(target_id.0).await?;
    record.reset_warnings(chat_id.0);
    ctx.state.users.save(&record).await?;

    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    ctx.state
        .audit
        .record(
            ActionLogEntry::new(chat_id.0, ActionKind::Unwarn, performed_by)
                .target(target_id.0)
                .meta(doc! { "reset": true }),
        )
        .await;

    ctx.reply(format!("Reset all warnings for {}.", target.user.mention()))
        .await?;
    Ok(())
}

pub async fn warns(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();

    // Without a target, show the caller's own warnings.
    let (user_id, mention) = match require_target_or_self(&ctx).await? {
        Some(pair) => pair,
        None => return Ok(()),
    };

    let settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;
    let record = ctx.state.users.get_by_id(user_id).await?;
    let state = record.as_ref().and_then(|r| r.chat_state_ref(chat_id.0));

    match state {
        Some(s) if s.warnings > 0 => {
            let mut text = format!("{mention} has {}/{} warnings:", s.warnings, settings.warn_limit);
            for (i, reason) in s.warn_reasons.iter().enumerate() {
                text.push_str(&format!("\n {}. {}", i + 1, html_escape(reason)));
            }
            ctx.reply(text).await?;
        }
        _ => {
            ctx.reply(format!("{mention} has no warnings.")).await?;
        }
    }
    Ok(())
}

async fn require_target_or_self(ctx: &CommandContext) -> anyhow::Result<Option<(u64, String)>> {
    if ctx.args.trim().is_empty() && ctx.msg.reply_to_message().is_none() {
        let Some(sender) = ctx.sender() else {
            return Ok(None);
        };
        return Ok(Some((
            sender.id.0,
            crate::utils::mention(sender.id.0, &sender.first_name),
        )));
    }
    Ok(require_target(ctx)
        .await?
        .map(|(id, target)| (id.0, target.user.mention())))
}

pub async fn warnlimit(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let mut settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;

    let arg = ctx.args.trim();
    if arg.is_empty() {
        ctx.reply(format!("The warn limit here is {}.", settings.warn_limit))
            .await?;
        return Ok(());
    }

    match arg.parse::<u32>() {
        Ok(limit) if (1..=100).contains(&limit) => {
            settings.warn_limit = limit;
            settings.touch();
            ctx.state.chats.save(&settings).await?;
            ctx.reply(format!("Warn limit set to {limit}.")).await?;
        }
        _ => {
            ctx.reply("The warn limit has to be a number between 1 and 100.")
                .await?;
        }
    }
    Ok(())
}

pub async fn warnmode(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let mut settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;

    let arg = ctx.args.trim();
    if arg.is_empty() {
        ctx.reply(format!(
            "The warn mode here is <b>{}</b>. Options: ban, mute, kick, nothing.",
            settings.warn_mode.as_str()
        ))
        .await?;
        return Ok(());
    }

    match PunishMode::parse(arg) {
        Some(mode) => {
            settings.warn_mode = mode;
            settings.touch();
            ctx.state.chats.save(&settings).await?;
            ctx.reply(format!("Warn mode set to <b>{}</b>.", mode.as_str()))
                .await?;
        }
        None => {
            ctx.reply("I don't know that mode. Options: ban, mute, kick, nothing.")
                .await?;
        }
    }
    Ok(())
}
