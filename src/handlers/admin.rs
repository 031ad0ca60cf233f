//! Promote/demote and admin cache maintenance.

use teloxide::payloads::PromoteChatMemberSetters;
use teloxide::prelude::Requester;

use crate::database::models::{ActionKind, ActionLogEntry};
use crate::registry::CommandContext;

use super::common::require_target;

// Telegram rejects admin titles longer than this.
const MAX_TITLE_LEN: usize = 16;

/// The optional custom admin title from the argument remainder,
/// truncated to the transport limit.
fn custom_title(args: &str) -> Option<String> {
    let title = args.trim();
    if title.is_empty() {
        return None;
    }
    Some(title.chars().take(MAX_TITLE_LEN).collect())
}

pub async fn promote(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };

    // A modest default right set; the chat owner can extend it by hand.
    ctx.bot
        .promote_chat_member(chat_id, target_id)
        .can_delete_messages(true)
        .can_restrict_members(true)
        .can_pin_messages(true)
        .can_invite_users(true)
        .await?;

    let title = custom_title(&target.remainder);
    if let Some(title) = &title {
        ctx.bot
            .set_chat_administrator_custom_title(chat_id, target_id, title)
            .await?;
    }

    // The cached (possibly negative) admin entry is stale now.
    ctx.state.permissions.invalidate(chat_id, target_id);

    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    ctx.state
        .audit
        .record(
            ActionLogEntry::new(chat_id.0, ActionKind::Promote, performed_by).target(target_id.0),
        )
        .await;

    let mut text = format!("Promoted {}", target.user.mention());
    if let Some(title) = &title {
        text.push_str(&format!(" as <b>{}</b>", crate::utils::html_escape(title)));
    }
    text.push('.');
    ctx.reply(text).await?;
    Ok(())
}

pub async fn demote(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some((target_id, target)) = require_target(&ctx).await? else {
        return Ok(());
    };

    // Revoking every right demotes back to a plain member.
    ctx.bot
        .promote_chat_member(chat_id, target_id)
        .can_manage_chat(false)
        .can_delete_messages(false)
        .can_restrict_members(false)
        .can_promote_members(false)
        .can_change_info(false)
        .can_invite_users(false)
        .can_pin_messages(false)
        .await?;

    ctx.state.permissions.invalidate(chat_id, target_id);

    let performed_by = ctx.sender().map(|u| u.id.0).unwrap_or_default();
    ctx.state
        .audit
        .record(
            ActionLogEntry::new(chat_id.0, ActionKind::Demote, performed_by).target(target_id.0),
        )
        .await;

    ctx.reply(format!("Demoted {}.", target.user.mention())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_title_from_remainder() {
        assert_eq!(custom_title(""), None);
        assert_eq!(custom_title("   "), None);
        assert_eq!(custom_title(" Janitor "), Some("Janitor".to_string()));
    }

    #[test]
    fn custom_title_truncates_to_transport_limit() {
        let long = "a much too long admin title";
        let title = custom_title(long).unwrap();
        assert_eq!(title.chars().count(), MAX_TITLE_LEN);
        assert_eq!(title, "a much too long ");
    }
}
