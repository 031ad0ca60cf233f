//! Lock commands over the per-chat lock table.

use crate::database::models::{ActionKind, ActionLogEntry, LockKind};
use crate::registry::CommandContext;

pub async fn lock(ctx: CommandContext) -> anyhow::Result<()> {
    set_locks(ctx, true).await
}

pub async fn unlock(ctx: CommandContext) -> anyhow::Result<()> {
    set_locks(ctx, false).await
}

async fn set_locks(ctx: CommandContext, locked: bool) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let args = ctx.args.trim();
    if args.is_empty() {
        ctx.reply(format!(
            "What should I {}? Use /locks to see the lock types.",
            if locked { "lock" } else { "unlock" }
        ))
        .await?;
        return Ok(());
    }

    let mut kinds = Vec::new();
    for word in args.split_whitespace() {
        match LockKind::parse(word) {
            Some(kind) => kinds.push(kind),
            None => {
                ctx.reply(format!(
                    "I don't know the lock type <code>{}</code>. Use /locks to see them.",
                    crate::utils::html_escape(word)
                ))
                .await?;
                return Ok(());
            }
        }
    }

    let mut settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;
    for kind in &kinds {
        settings.set_lock(*kind, locked);
    }
    ctx.state.chats.save(&settings).await?;

    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    let kind = if locked {
        ActionKind::Lock
    } else {
        ActionKind::Unlock
    };
    let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
    ctx.state
        .audit
        .record(
            ActionLogEntry::new(chat_id.0, kind, performed_by)
                .meta(mongodb::bson::doc! { "locks": names.clone() }),
        )
        .await;

    ctx.reply(format!(
        "{} {}.",
        if locked { "Locked" } else { "Unlocked" },
        names.join(", ")
    ))
    .await?;
    Ok(())
}

pub async fn locks(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let settings = ctx
        .state
        .chats
        .get_or_create(chat_id.0, ctx.chat_title())
        .await?;

    let mut text = String::from("Locks in this chat:");
    for kind in LockKind::ALL {
        let mark = if settings.is_locked(kind) { "🔒" } else { "—" };
        text.push_str(&format!("\n{mark} <code>{}</code>", kind.as_str()));
    }
    ctx.reply(text).await?;
    Ok(())
}
