//! Command bodies and the explicit registration table.

mod admin;
mod approval;
mod bans;
mod common;
mod disabling;
mod federations;
mod filters;
mod help;
mod locks;
mod misc;
mod mutes;
mod notes;
mod warns;

use std::sync::Arc;

use teloxide::prelude::Requester;
use teloxide::types::CallbackQuery;

use crate::bot::{AppState, ThrottledBot};
use crate::gates::GateSet;
use crate::permissions::AdminPerm;
use crate::registry::{handler, Category, CommandRegistry, CommandSpec, RegistryError};

/// Build the full command table. Every command the bot answers is listed
/// here; a duplicate trigger anywhere below aborts startup.
pub fn build_registry() -> Result<CommandRegistry, RegistryError> {
    let mut r = CommandRegistry::new();

    let restrict = || {
        GateSet::new()
            .group_only()
            .bot_admin()
            .perm(AdminPerm::RestrictMembers)
    };
    let chat_admin = || GateSet::new().group_only().admin();
    let change_info = || GateSet::new().group_only().perm(AdminPerm::ChangeInfo);

    // Admin
    r.register(CommandSpec {
        triggers: vec!["promote"],
        description: "Promote a user to admin",
        usage: "/promote <reply|user> [title]",
        category: Category::Admin,
        gates: GateSet::new()
            .group_only()
            .bot_admin()
            .perm(AdminPerm::PromoteMembers),
        hidden: false,
        handler: handler(admin::promote),
    })?;
    r.register(CommandSpec {
        triggers: vec!["demote"],
        description: "Demote an admin back to member",
        usage: "/demote <reply|user>",
        category: Category::Admin,
        gates: GateSet::new()
            .group_only()
            .bot_admin()
            .perm(AdminPerm::PromoteMembers),
        hidden: false,
        handler: handler(admin::demote),
    })?;

    // Moderation
    r.register(CommandSpec {
        triggers: vec!["ban"],
        description: "Ban a user",
        usage: "/ban <reply|user> [reason]",
        category: Category::Moderation,
        gates: restrict(),
        hidden: false,
        handler: handler(bans::ban),
    })?;
    r.register(CommandSpec {
        triggers: vec!["sban"],
        description: "Ban silently, deleting the command",
        usage: "/sban <reply|user> [reason]",
        category: Category::Moderation,
        gates: restrict(),
        hidden: false,
        handler: handler(bans::sban),
    })?;
    r.register(CommandSpec {
        triggers: vec!["dban"],
        description: "Ban and delete the replied-to message",
        usage: "/dban <reply> [reason]",
        category: Category::Moderation,
        gates: restrict(),
        hidden: false,
        handler: handler(bans::dban),
    })?;
    r.register(CommandSpec {
        triggers: vec!["tban"],
        description: "Ban for a limited time",
        usage: "/tban <reply|user> <time> [reason]",
        category: Category::Moderation,
        gates: restrict(),
        hidden: false,
        handler: handler(bans::tban),
    })?;
    r.register(CommandSpec {
        triggers: vec!["unban"],
        description: "Lift a ban",
        usage: "/unban <reply|user>",
        category: Category::Moderation,
        gates: restrict(),
        hidden: false,
        handler: handler(bans::unban),
    })?;
    r.register(CommandSpec {
        triggers: vec!["kick", "punch"],
        description: "Remove a user; they can rejoin",
        usage: "/kick <reply|user> [reason]",
        category: Category::Moderation,
        gates: restrict(),
        hidden: false,
        handler: handler(bans::kick),
    })?;
    r.register(CommandSpec {
        triggers: vec!["mute"],
        description: "Mute a user",
        usage: "/mute <reply|user> [reason]",
        category: Category::Moderation,
        gates: restrict(),
        hidden: false,
        handler: handler(mutes::mute),
    })?;
    r.register(CommandSpec {
        triggers: vec!["tmute"],
        description: "Mute for a limited time",
        usage: "/tmute <reply|user> <time> [reason]",
        category: Category::Moderation,
        gates: restrict(),
        hidden: false,
        handler: handler(mutes::tmute),
    })?;
    r.register(CommandSpec {
        triggers: vec!["unmute"],
        description: "Lift a mute",
        usage: "/unmute <reply|user>",
        category: Category::Moderation,
        gates: restrict(),
        hidden: false,
        handler: handler(mutes::unmute),
    })?;
    r.register(CommandSpec {
        triggers: vec!["setflood"],
        description: "Set the flood message limit",
        usage: "/setflood [limit]",
        category: Category::Moderation,
        gates: change_info(),
        hidden: false,
        handler: handler(misc::setflood),
    })?;
    r.register(CommandSpec {
        triggers: vec!["floodmode"],
        description: "Set the flood punishment",
        usage: "/floodmode [ban|mute|kick|nothing]",
        category: Category::Moderation,
        gates: change_info(),
        hidden: false,
        handler: handler(misc::floodmode),
    })?;

    // Warns
    r.register(CommandSpec {
        triggers: vec!["warn"],
        description: "Warn a user",
        usage: "/warn <reply|user> [reason]",
        category: Category::Warns,
        gates: restrict(),
        hidden: false,
        handler: handler(warns::warn),
    })?;
    r.register(CommandSpec {
        triggers: vec!["rmwarn", "unwarn"],
        description: "Remove the latest warning",
        usage: "/rmwarn <reply|user>",
        category: Category::Warns,
        gates: restrict(),
        hidden: false,
        handler: handler(warns::rmwarn),
    })?;
    r.register(CommandSpec {
        triggers: vec!["resetwarns"],
        description: "Clear all warnings for a user",
        usage: "/resetwarns <reply|user>",
        category: Category::Warns,
        gates: restrict(),
        hidden: false,
        handler: handler(warns::resetwarns),
    })?;
    r.register(CommandSpec {
        triggers: vec!["warns"],
        description: "Show a user's warnings",
        usage: "/warns [reply|user]",
        category: Category::Warns,
        gates: GateSet::new().group_only().rate_limit(3, 60),
        hidden: false,
        handler: handler(warns::warns),
    })?;
    r.register(CommandSpec {
        triggers: vec!["warnlimit"],
        description: "Show or set the warn limit",
        usage: "/warnlimit [number]",
        category: Category::Warns,
        gates: change_info(),
        hidden: false,
        handler: handler(warns::warnlimit),
    })?;
    r.register(CommandSpec {
        triggers: vec!["warnmode"],
        description: "Show or set the warn punishment",
        usage: "/warnmode [ban|mute|kick|nothing]",
        category: Category::Warns,
        gates: change_info(),
        hidden: false,
        handler: handler(warns::warnmode),
    })?;

    // Approval
    r.register(CommandSpec {
        triggers: vec!["approve"],
        description: "Exempt a user from flood control and approval gates",
        usage: "/approve <reply|user>",
        category: Category::Approval,
        gates: chat_admin(),
        hidden: false,
        handler: handler(approval::approve),
    })?;
    r.register(CommandSpec {
        triggers: vec!["unapprove"],
        description: "Revoke a user's approval",
        usage: "/unapprove <reply|user>",
        category: Category::Approval,
        gates: chat_admin(),
        hidden: false,
        handler: handler(approval::unapprove),
    })?;
    r.register(CommandSpec {
        triggers: vec!["approved"],
        description: "List approved users",
        usage: "/approved",
        category: Category::Approval,
        gates: chat_admin(),
        hidden: false,
        handler: handler(approval::approved),
    })?;

    // Locks
    r.register(CommandSpec {
        triggers: vec!["lock"],
        description: "Lock a content type",
        usage: "/lock <type...>",
        category: Category::Locks,
        gates: GateSet::new()
            .group_only()
            .bot_admin()
            .perm(AdminPerm::ChangeInfo),
        hidden: false,
        handler: handler(locks::lock),
    })?;
    r.register(CommandSpec {
        triggers: vec!["unlock"],
        description: "Unlock a content type",
        usage: "/unlock <type...>",
        category: Category::Locks,
        gates: GateSet::new()
            .group_only()
            .bot_admin()
            .perm(AdminPerm::ChangeInfo),
        hidden: false,
        handler: handler(locks::unlock),
    })?;
    r.register(CommandSpec {
        triggers: vec!["locks"],
        description: "Show lock states",
        usage: "/locks",
        category: Category::Locks,
        gates: GateSet::new().group_only().rate_limit(3, 60),
        hidden: false,
        handler: handler(locks::locks),
    })?;

    // Filters
    r.register(CommandSpec {
        triggers: vec!["filter"],
        description: "Add an auto-reply filter",
        usage: "/filter <trigger> <response>",
        category: Category::Filters,
        gates: chat_admin(),
        hidden: false,
        handler: handler(filters::filter),
    })?;
    r.register(CommandSpec {
        triggers: vec!["filters"],
        description: "List filters",
        usage: "/filters",
        category: Category::Filters,
        gates: GateSet::new().group_only().rate_limit(3, 60),
        hidden: false,
        handler: handler(filters::filters),
    })?;
    r.register(CommandSpec {
        triggers: vec!["stop"],
        description: "Remove a filter",
        usage: "/stop <trigger>",
        category: Category::Filters,
        gates: chat_admin(),
        hidden: false,
        handler: handler(filters::stop),
    })?;

    // Notes
    r.register(CommandSpec {
        triggers: vec!["save"],
        description: "Save a note",
        usage: "/save <name> <content>",
        category: Category::Notes,
        gates: chat_admin(),
        hidden: false,
        handler: handler(notes::save),
    })?;
    r.register(CommandSpec {
        triggers: vec!["get"],
        description: "Fetch a note",
        usage: "/get <name>",
        category: Category::Notes,
        gates: GateSet::new().group_only().rate_limit(3, 60),
        hidden: false,
        handler: handler(notes::get),
    })?;
    r.register(CommandSpec {
        triggers: vec!["notes", "saved"],
        description: "List notes",
        usage: "/notes",
        category: Category::Notes,
        gates: GateSet::new().group_only().rate_limit(3, 60),
        hidden: false,
        handler: handler(notes::notes),
    })?;
    r.register(CommandSpec {
        triggers: vec!["clear"],
        description: "Delete a note",
        usage: "/clear <name>",
        category: Category::Notes,
        gates: chat_admin(),
        hidden: false,
        handler: handler(notes::clear),
    })?;

    // Federations
    r.register(CommandSpec {
        triggers: vec!["newfed"],
        description: "Create a federation",
        usage: "/newfed <name>",
        category: Category::Federations,
        gates: GateSet::new().rate_limit(2, 300),
        hidden: false,
        handler: handler(federations::newfed),
    })?;
    r.register(CommandSpec {
        triggers: vec!["delfed"],
        description: "Delete the federation you own",
        usage: "/delfed",
        category: Category::Federations,
        gates: GateSet::new().rate_limit(2, 300),
        hidden: false,
        handler: handler(federations::delfed),
    })?;
    r.register(CommandSpec {
        triggers: vec!["joinfed"],
        description: "Enroll this chat in a federation",
        usage: "/joinfed <fed id>",
        category: Category::Federations,
        gates: chat_admin(),
        hidden: false,
        handler: handler(federations::joinfed),
    })?;
    r.register(CommandSpec {
        triggers: vec!["leavefed"],
        description: "Leave the current federation",
        usage: "/leavefed",
        category: Category::Federations,
        gates: chat_admin(),
        hidden: false,
        handler: handler(federations::leavefed),
    })?;
    r.register(CommandSpec {
        triggers: vec!["fban"],
        description: "Ban across the federation",
        usage: "/fban <reply|user> [reason]",
        category: Category::Federations,
        gates: GateSet::new().group_only().bot_admin(),
        hidden: false,
        handler: handler(federations::fban),
    })?;
    r.register(CommandSpec {
        triggers: vec!["unfban"],
        description: "Lift a federation ban",
        usage: "/unfban <reply|user>",
        category: Category::Federations,
        gates: GateSet::new().group_only().bot_admin(),
        hidden: false,
        handler: handler(federations::unfban),
    })?;
    r.register(CommandSpec {
        triggers: vec!["fedinfo"],
        description: "Show this chat's federation",
        usage: "/fedinfo",
        category: Category::Federations,
        gates: GateSet::new().group_only().rate_limit(3, 60),
        hidden: false,
        handler: handler(federations::fedinfo),
    })?;

    // Disabling
    r.register(CommandSpec {
        triggers: vec!["disable"],
        description: "Disable a command in this chat",
        usage: "/disable <command>",
        category: Category::Disabling,
        gates: chat_admin(),
        hidden: false,
        handler: handler(disabling::disable),
    })?;
    r.register(CommandSpec {
        triggers: vec!["enable"],
        description: "Re-enable a disabled command",
        usage: "/enable <command>",
        category: Category::Disabling,
        gates: chat_admin(),
        hidden: false,
        handler: handler(disabling::enable),
    })?;
    r.register(CommandSpec {
        triggers: vec!["disabled"],
        description: "List disabled commands",
        usage: "/disabled",
        category: Category::Disabling,
        gates: chat_admin(),
        hidden: false,
        handler: handler(disabling::disabled),
    })?;

    // Misc
    r.register(CommandSpec {
        triggers: vec!["id"],
        description: "Show chat and user IDs",
        usage: "/id [reply]",
        category: Category::Misc,
        gates: GateSet::new().rate_limit(3, 60),
        hidden: false,
        handler: handler(misc::id),
    })?;
    r.register(CommandSpec {
        triggers: vec!["info"],
        description: "Show what I know about a user",
        usage: "/info [reply|user]",
        category: Category::Misc,
        gates: GateSet::new().group_only().rate_limit(3, 60),
        hidden: false,
        handler: handler(misc::info),
    })?;
    r.register(CommandSpec {
        triggers: vec!["actionlog", "logs"],
        description: "Show recent moderation actions",
        usage: "/actionlog [reply|user]",
        category: Category::Misc,
        gates: chat_admin(),
        hidden: false,
        handler: handler(misc::actionlog),
    })?;
    r.register(CommandSpec {
        triggers: vec!["settings"],
        description: "Show this chat's settings",
        usage: "/settings",
        category: Category::Misc,
        gates: chat_admin(),
        hidden: false,
        handler: handler(misc::settings),
    })?;
    r.register(CommandSpec {
        triggers: vec!["start"],
        description: "Introduction",
        usage: "/start",
        category: Category::Misc,
        gates: GateSet::new().private_only(),
        hidden: true,
        handler: handler(misc::start),
    })?;
    r.register(CommandSpec {
        triggers: vec!["help"],
        description: "Show this help",
        usage: "/help",
        category: Category::Misc,
        gates: GateSet::new().rate_limit(3, 60),
        hidden: false,
        handler: handler(help::help),
    })?;

    Ok(r)
}

/// Route callback queries by their data prefix.
pub async fn on_callback(
    bot: ThrottledBot,
    query: CallbackQuery,
    state: Arc<AppState>,
) -> anyhow::Result<()> {
    let Some(data) = query.data.clone() else {
        bot.answer_callback_query(query.id.clone()).await?;
        return Ok(());
    };

    if let Some(rest) = data.strip_prefix("help:") {
        help::on_help_callback(&bot, &query, &state, rest).await?;
    } else if let Some(rest) = data.strip_prefix("captcha:") {
        crate::events::on_captcha_callback(&bot, &query, &state, rest).await?;
    } else {
        bot.answer_callback_query(query.id.clone()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_builds_cleanly() {
        let registry = build_registry().expect("registration table must be valid");
        assert!(registry.len() > 30);

        // Spot-check dispatch metadata.
        let ban = registry.find("ban").unwrap();
        assert!(ban.gates.bot_admin);
        assert!(ban.gates.admin);

        let warns = registry.find("warns").unwrap();
        assert!(!warns.gates.admin);
        assert_eq!(
            warns.gates.rate_limit.map(|l| (l.max_calls, l.window_secs)),
            Some((3, 60))
        );

        // Aliases resolve to the same command.
        assert!(registry.find("punch").is_some());
        assert!(registry.find("unwarn").is_some());
    }
}
