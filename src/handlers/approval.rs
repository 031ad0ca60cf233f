//! Approval commands: exempt trusted users from flood control and the
//! approved-or-admin gate.

use crate::database::models::{ActionKind, ActionLogEntry};
use crate::registry::CommandContext;

use super::common::require_target;

pub async fn approve(ctx: CommandContext) -> anyhow::Result<()> {
    set_approval(ctx, true).await
}

pub async fn unapprove(ctx: CommandContext) -> anyhow::Result<()> {
    set_approval(ctx, false).await
}

async fn set_approval(ctx: CommandContext, approved: bool) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };

    let mut record = ctx.state.users.get_or_create(target_id.0).await?;
    record.set_approved(chat_id.0, approved);
    ctx.state.users.save(&record).await?;

    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    let kind = if approved {
        ActionKind::Approve
    } else {
        ActionKind::Unapprove
    };
    ctx.state
        .audit
        .record(ActionLogEntry::new(chat_id.0, kind, performed_by).target(target_id.0))
        .await;

    let verdict = if approved {
        "is now approved: flood control and approval-gated commands won't touch them"
    } else {
        "is no longer approved"
    };
    ctx.reply(format!("{} {verdict}.", target.user.mention())).await?;
    Ok(())
}

pub async fn approved(ctx: CommandContext) -> anyhow::Result<()> {
    // The user store is keyed by user, not chat, so listing means asking
    // the collection for members with the flag set in this chat.
    use futures::TryStreamExt;
    use mongodb::bson::doc;

    let chat_id = ctx.chat_id();
    let key = format!("chats.{}.approved", chat_id.0);
    let cursor = ctx
        .state
        .db
        .collection::<crate::database::models::UserRecord>("users")
        .find(doc! { &key: true })
        .await?;
    let records: Vec<_> = cursor.try_collect().await?;

    if records.is_empty() {
        ctx.reply("No approved users here.").await?;
        return Ok(());
    }

    let mut text = String::from("Approved users:");
    for record in &records {
        text.push_str(&format!(
            "\n- {} ({})",
            crate::utils::html_escape(&record.display_name()),
            record.user_id
        ));
    }
    for chunk in crate::utils::split_chunks(&text, crate::utils::text::MAX_MESSAGE_LEN) {
        ctx.reply(chunk).await?;
    }
    Ok(())
}
