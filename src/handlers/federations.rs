//! Federation commands: shared ban lists across chats.

use teloxide::prelude::Requester;
use teloxide::types::ChatId;
use tracing::{info, warn};

use crate::database::models::{ActionKind, ActionLogEntry, FederationRecord};
use crate::registry::CommandContext;
use crate::utils::html_escape;

use super::common::{reason_or_default, require_target};

pub async fn newfed(ctx: CommandContext) -> anyhow::Result<()> {
    let Some(sender) = ctx.sender() else {
        return Ok(());
    };
    let name = ctx.args.trim();
    if name.is_empty() || name.len() > 64 {
        ctx.reply("Give your federation a name (up to 64 characters): <code>/newfed My Fed</code>.")
            .await?;
        return Ok(());
    }

    // One federation per owner.
    if let Some(existing) = ctx.state.federations.owned_by(sender.id.0).await? {
        ctx.reply(format!(
            "You already own the federation <b>{}</b> (<code>{}</code>). Delete it before creating another.",
            html_escape(&existing.name),
            existing.fed_id
        ))
        .await?;
        return Ok(());
    }

    let fed = FederationRecord::new(name, sender.id.0);
    ctx.state.federations.create(&fed).await?;
    info!(fed_id = %fed.fed_id, owner = sender.id.0, "federation created");

    ctx.reply(format!(
        "Created federation <b>{}</b>.\nID: <code>{}</code>\nUse <code>/joinfed {}</code> in a chat to enroll it.",
        html_escape(&fed.name),
        fed.fed_id,
        fed.fed_id
    ))
    .await?;
    Ok(())
}

pub async fn joinfed(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let fed_id = ctx.args.trim();
    if fed_id.is_empty() {
        ctx.reply("Which federation? <code>/joinfed &lt;fed id&gt;</code>.")
            .await?;
        return Ok(());
    }

    let Some(fed) = ctx.state.federations.get(fed_id).await? else {
        ctx.reply("I can't find a federation with that ID.").await?;
        return Ok(());
    };

    let mut settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;
    settings.fed_id = Some(fed.fed_id.clone());
    settings.touch();
    ctx.state.chats.save(&settings).await?;

    ctx.reply(format!(
        "This chat now follows the federation <b>{}</b>.",
        html_escape(&fed.name)
    ))
    .await?;
    Ok(())
}

pub async fn leavefed(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let mut settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;

    if settings.fed_id.take().is_none() {
        ctx.reply("This chat isn't in a federation.").await?;
        return Ok(());
    }
    settings.touch();
    ctx.state.chats.save(&settings).await?;
    ctx.reply("This chat has left its federation.").await?;
    Ok(())
}

pub async fn fban(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some(sender) = ctx.sender().cloned() else {
        return Ok(());
    };

    let Some(mut fed) = chat_federation(&ctx).await? else {
        return Ok(());
    };
    if !fed.is_admin(sender.id.0) {
        ctx.reply("Only federation admins can fban.").await?;
        return Ok(());
    }

    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };
    if fed.is_admin(target_id.0) {
        ctx.reply("That user is a federation admin.").await?;
        return Ok(());
    }

    let reason = reason_or_default(Some(&target.remainder));

    let rebanned = fed.ban_entry(target_id.0).is_some();
    fed.add_ban(target_id.0, &reason, sender.id.0);
    ctx.state.federations.save(&fed).await?;

    // Enforce in every enrolled chat the bot can act in.
    let chats = ctx.state.chats.chats_in_federation(&fed.fed_id).await?;
    let mut banned_in = 0usize;
    for chat in &chats {
        match ctx.bot.ban_chat_member(ChatId(chat.chat_id), target_id).await {
            Ok(_) => banned_in += 1,
            Err(e) => warn!(chat_id = chat.chat_id, "fban enforcement failed: {e}"),
        }
    }

    ctx.state
        .audit
        .record(
            ActionLogEntry::new(chat_id.0, ActionKind::FedBan, sender.id.0)
                .target(target_id.0)
                .reason(reason.clone())
                .meta(mongodb::bson::doc! {
                    "fed_id": &fed.fed_id,
                    "chats_banned": banned_in as i32,
                }),
        )
        .await;

    ctx.reply(format!(
        "{} {} from <b>{}</b> ({banned_in} chats).\nReason: {}",
        if rebanned { "Updated the fban on" } else { "Fbanned" },
        target.user.mention(),
        html_escape(&fed.name),
        html_escape(&reason)
    ))
    .await?;
    Ok(())
}

pub async fn unfban(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some(sender) = ctx.sender().cloned() else {
        return Ok(());
    };

    let Some(mut fed) = chat_federation(&ctx).await? else {
        return Ok(());
    };
    if !fed.is_admin(sender.id.0) {
        ctx.reply("Only federation admins can unfban.").await?;
        return Ok(());
    }

    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };

    if !fed.remove_ban(target_id.0) {
        ctx.reply(format!("{} isn't fbanned.", target.user.mention()))
            .await?;
        return Ok(());
    }
    ctx.state.federations.save(&fed).await?;

    let chats = ctx.state.chats.chats_in_federation(&fed.fed_id).await?;
    for chat in &chats {
        if let Err(e) = ctx
            .bot
            .unban_chat_member(ChatId(chat.chat_id), target_id)
            .await
        {
            warn!(chat_id = chat.chat_id, "unfban enforcement failed: {e}");
        }
    }

    ctx.state
        .audit
        .record(
            ActionLogEntry::new(chat_id.0, ActionKind::FedUnban, sender.id.0)
                .target(target_id.0)
                .meta(mongodb::bson::doc! { "fed_id": &fed.fed_id }),
        )
        .await;

    ctx.reply(format!(
        "Unfbanned {} from <b>{}</b>.",
        target.user.mention(),
        html_escape(&fed.name)
    ))
    .await?;
    Ok(())
}

/// Delete a federation you own. Enrolled chats keep a dangling fed_id
/// until they /joinfed elsewhere or /leavefed.
pub async fn delfed(ctx: CommandContext) -> anyhow::Result<()> {
    let Some(sender) = ctx.sender() else {
        return Ok(());
    };

    let Some(fed) = ctx.state.federations.owned_by(sender.id.0).await? else {
        ctx.reply("You don't own a federation.").await?;
        return Ok(());
    };

    ctx.state.federations.delete(&fed.fed_id).await?;
    info!(fed_id = %fed.fed_id, owner = sender.id.0, "federation deleted");
    ctx.reply(format!(
        "Deleted the federation <b>{}</b>.",
        html_escape(&fed.name)
    ))
    .await?;
    Ok(())
}

pub async fn fedinfo(ctx: CommandContext) -> anyhow::Result<()> {
    let Some(fed) = chat_federation(&ctx).await? else {
        return Ok(());
    };

    ctx.reply(format!(
        "<b>{}</b>\nID: <code>{}</code>\nOwner: <code>{}</code>\nAdmins: {}\nBanned users: {}",
        html_escape(&fed.name),
        fed.fed_id,
        fed.owner_id,
        fed.admins.len() + 1,
        fed.banned_users.len()
    ))
    .await?;
    Ok(())
}

/// The federation this chat is enrolled in, replying when there is none.
async fn chat_federation(ctx: &CommandContext) -> anyhow::Result<Option<FederationRecord>> {
    let chat_id = ctx.chat_id();
    let settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;

    let Some(fed_id) = settings.fed_id.as_deref() else {
        ctx.reply("This chat isn't in a federation. Join one with /joinfed.")
            .await?;
        return Ok(None);
    };
    match ctx.state.federations.get(fed_id).await? {
        Some(fed) => Ok(Some(fed)),
        None => {
            ctx.reply("This chat points at a federation that no longer exists.")
                .await?;
            Ok(None)
        }
    }
}
