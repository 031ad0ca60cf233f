//! Mute commands, mirroring the ban family over `restrictChatMember`.

use teloxide::payloads::RestrictChatMemberSetters;
use teloxide::prelude::Requester;
use teloxide::types::ChatPermissions;
use tracing::info;

use crate::database::models::{ActionKind, ActionLogEntry};
use crate::registry::CommandContext;
use crate::utils::{format_duration, html_escape, parse_duration_bounded, MAX_RESTRICTION_SECS};

use super::common::{reason_or_default, require_target, target_is_protected, temp_restriction_meta};

pub async fn mute(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };
    if target_is_protected(&ctx, target_id).await? {
        return Ok(());
    }

    ctx.bot
        .restrict_chat_member(chat_id, target_id, ChatPermissions::empty())
        .await?;
    info!(chat_id = chat_id.0, target = target_id.0, "muted");

    let reason = (!target.remainder.is_empty()).then(|| target.remainder.clone());
    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    let entry = ActionLogEntry::new(chat_id.0, ActionKind::Mute, performed_by)
        .target(target_id.0)
        .reason(reason_or_default(reason.as_deref()));
    ctx.state.audit.record(entry).await;

    let mut text = format!("Muted {}.", target.user.mention());
    if let Some(reason) = &reason {
        text.push_str(&format!("\nReason: {}", html_escape(reason)));
    }
    ctx.reply(text).await?;
    Ok(())
}

pub async fn tmute(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };
    if target_is_protected(&ctx, target_id).await? {
        return Ok(());
    }

    let mut parts = target.remainder.splitn(2, char::is_whitespace);
    let Some(duration_arg) = parts.next().filter(|s| !s.is_empty()) else {
        ctx.reply("Give me a duration, like <code>/tmute @user 1h flooding</code>.")
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
        .restrict_chat_member(chat_id, target_id, ChatPermissions::empty())
        .until_date(until)
        .await?;
    info!(chat_id = chat_id.0, target = target_id.0, duration, "temp muted");

    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    let entry = ActionLogEntry::new(chat_id.0, ActionKind::Mute, performed_by)
        .target(target_id.0)
        .reason(reason_or_default(reason.as_deref()))
        .meta(temp_restriction_meta(duration));
    ctx.state.audit.record(entry).await;

    let mut text = format!(
        "Muted {} for {}.",
        target.user.mention(),
        format_duration(duration)
    );
    if let Some(reason) = &reason {
        text.push_str(&format!("\nReason: {}", html_escape(reason)));
    }
    ctx.reply(text).await?;
    Ok(())
}

pub async fn unmute(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };

    // Restore the full member permission set; the chat's own defaults
    // still cap what the member can actually do.
    ctx.bot
        .restrict_chat_member(chat_id, target_id, ChatPermissions::all())
        .await?;

    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    ctx.state
        .audit
        .record(
            ActionLogEntry::new(chat_id.0, ActionKind::Unmute, performed_by).target(target_id.0),
        )
        .await;

    ctx.reply(format!("Unmuted {}.", target.user.mention())).await?;
    Ok(())
}
