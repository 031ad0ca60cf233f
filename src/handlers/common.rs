//! Helpers shared by moderation handlers.

use teloxide::prelude::Requester;
use teloxide::types::UserId;

use crate::registry::CommandContext;
use crate::resolver::{self, ResolveError, ResolvedTarget};

/// Resolve the command's target, replying with the problem and returning
/// `None` when there is nothing actionable. The returned ID is always
/// concrete.
pub async fn require_target(
    ctx: &CommandContext,
) -> anyhow::Result<Option<(UserId, ResolvedTarget)>> {
    let target = match resolver::resolve_target(&ctx.msg, &ctx.args, &ctx.state.users).await {
        Ok(target) => target,
        Err(ResolveError::Db(e)) => return Err(e),
        Err(e) => {
            ctx.reply(e.to_string()).await?;
            return Ok(None);
        }
    };

    let Some(id) = target.user.id else {
        ctx.reply(format!(
            "I haven't seen {} yet, so I can't act on them. Reply to one of their messages instead.",
            target.user.display_name()
        ))
        .await?;
        return Ok(None);
    };

    Ok(Some((id, target)))
}

/// Reason recorded on audit entries when the invoker gave none.
pub const DEFAULT_REASON: &str = "No reason provided";

/// The trimmed reason text, or [`DEFAULT_REASON`] when empty or absent.
pub fn reason_or_default(reason: Option<&str>) -> String {
    reason
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_REASON)
        .to_string()
}

/// Audit metadata for temporary restrictions (tban, tmute).
pub fn temp_restriction_meta(duration_secs: u64) -> mongodb::bson::Document {
    mongodb::bson::doc! { "duration_seconds": duration_secs as i64 }
}

/// Refuse to act on the bot itself, the invoking user, admins, and
/// operators. Replies and returns true when the target is protected.
pub async fn target_is_protected(ctx: &CommandContext, target_id: UserId) -> anyhow::Result<bool> {
    let chat_id = ctx.chat_id();

    let me = ctx.bot.get_me().await?;
    if target_id == me.id {
        ctx.reply("I'm not going to do that to myself.").await?;
        return Ok(true);
    }

    if ctx.sender().map(|u| u.id) == Some(target_id) {
        ctx.reply("Doing that to yourself seems unwise.").await?;
        return Ok(true);
    }

    if ctx.state.permissions.is_operator(target_id)
        || ctx.state.permissions.is_admin(chat_id, target_id).await?
    {
        ctx.reply("That user is an admin; I can't act on them.").await?;
        return Ok(true);
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_reason_gets_the_default() {
        assert_eq!(reason_or_default(None), "No reason provided");
        assert_eq!(reason_or_default(Some("")), "No reason provided");
        assert_eq!(reason_or_default(Some("   ")), "No reason provided");
        assert_eq!(reason_or_default(Some(" spam ")), "spam");
    }

    #[test]
    fn temp_restriction_metadata_names_duration_seconds() {
        let meta = temp_restriction_meta(3600);
        assert_eq!(meta.get_i64("duration_seconds").unwrap(), 3600);
    }
}
