//! Ban, kick, and unban commands.

use mongodb::bson::doc;
use teloxide::payloads::BanChatMemberSetters;
use teloxide::prelude::Requester;
use tracing::info;

use crate::database::models::{ActionKind, ActionLogEntry};
use crate::registry::CommandContext;
use crate::utils::{format_duration, html_escape, parse_duration_bounded, MAX_RESTRICTION_SECS};

use super::common::{reason_or_default, require_target, target_is_protected, temp_restriction_meta};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BanMode {
    Plain,
    /// Delete the invoking command first and stay quiet.
    Silent,
    /// Delete the replied-to message as well.
    DeleteReplied,
}

pub async fn ban(ctx: CommandContext) -> anyhow::Result<()> {
    ban_action(ctx, BanMode::Plain).await
}

pub async fn sban(ctx: CommandContext) -> anyhow::Result<()> {
    ban_action(ctx, BanMode::Silent).await
}

pub async fn dban(ctx: CommandContext) -> anyhow::Result<()> {
    ban_action(ctx, BanMode::DeleteReplied).await
}

async fn ban_action(ctx: CommandContext, mode: BanMode) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };
    if target_is_protected(&ctx, target_id).await? {
        return Ok(());
    }

    if mode == BanMode::Silent {
        let _ = ctx.bot.delete_message(chat_id, ctx.msg.id).await;
    }
    if mode == BanMode::DeleteReplied
        && let Some(reply) = ctx.msg.reply_to_message()
    {
        let _ = ctx.bot.delete_message(chat_id, reply.id).await;
    }

    ctx.bot.ban_chat_member(chat_id, target_id).await?;
    info!(chat_id = chat_id.0, target = target_id.0, "banned");

    let reason = (!target.remainder.is_empty()).then(|| target.remainder.clone());
    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    let entry = ActionLogEntry::new(chat_id.0, ActionKind::Ban, performed_by)
        .target(target_id.0)
        .reason(reason_or_default(reason.as_deref()))
        .meta(doc! { "revoke_messages": mode == BanMode::DeleteReplied });
    ctx.state.audit.record(entry).await;

    if mode != BanMode::Silent {
        let mut text = format!("Banned {}.", target.user.mention());
        if let Some(reason) = &reason {
            text.push_str(&format!("\nReason: {}", html_escape(reason)));
        }
        ctx.reply(text).await?;
    }
    Ok(())
}

pub async fn tban(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };
    if target_is_protected(&ctx, target_id).await? {
        return Ok(());
    }

    let mut parts = target.remainder.splitn(2, char::is_whitespace);
    let Some(duration_arg) = parts.next().filter(|s| !s.is_empty()) else {
        ctx.reply("Give me a duration, like <code>/tban @user 2d spam</code>.")
            .await?;
        return Ok(());
    };
    let duration = match parse_duration_bounded(duration_arg, 30, Some(MAX_RESTRICTION_SECS)) {
        Ok(secs) => secs,
        Err(e) => {
            ctx.reply(e).await?;
            return Ok(());
        }
    };
    let reason = parts.next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let until = chrono::Utc::now() + chrono::Duration::seconds(duration as i64);
    ctx.bot
        .ban_chat_member(chat_id, target_id)
        .until_date(until)
        .await?;
    info!(chat_id = chat_id.0, target = target_id.0, duration, "temp banned");

    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    let entry = ActionLogEntry::new(chat_id.0, ActionKind::Ban, performed_by)
        .target(target_id.0)
        .reason(reason_or_default(reason.as_deref()))
        .meta(temp_restriction_meta(duration));
    ctx.state.audit.record(entry).await;

    let mut text = format!(
        "Banned {} for {}.",
        target.user.mention(),
        format_duration(duration)
    );
    if let Some(reason) = &reason {
        text.push_str(&format!("\nReason: {}", html_escape(reason)));
    }
    ctx.reply(text).await?;
    Ok(())
}

pub async fn unban(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };

    ctx.bot.unban_chat_member(chat_id, target_id).await?;

    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    ctx.state
        .audit
        .record(ActionLogEntry::new(chat_id.0, ActionKind::Unban, performed_by).target(target_id.0))
        .await;

    ctx.reply(format!("Unbanned {}.", target.user.mention())).await?;
    Ok(())
}

/// Kick is ban-then-unban at the transport: removed, but free to rejoin.
pub async fn kick(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };
    if target_is_protected(&ctx, target_id).await? {
        return Ok(());
    }

    ctx.bot.ban_chat_member(chat_id, target_id).await?;
    ctx.bot.unban_chat_member(chat_id, target_id).await?;
    info!(chat_id = chat_id.0, target = target_id.0, "kicked");

    let reason = (!target.remainder.is_empty()).then(|| target.remainder.clone());
    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    let entry = ActionLogEntry::new(chat_id.0, ActionKind::Kick, performed_by)
        .target(target_id.0)
        .reason(reason_or_default(reason.as_deref()));
    ctx.state.audit.record(entry).await;

    let mut text = format!("Kicked {}.", target.user.mention());
    if let Some(reason) = &reason {
        text.push_str(&format!("\nReason: {}", html_escape(reason)));
    }
    ctx.reply(text).await?;
    Ok(())
}
