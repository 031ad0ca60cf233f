//! Precondition gates applied before any command body runs.
//!
//! Every command declares a [`GateSet`]; the dispatcher evaluates the
//! gates in a fixed order and stops at the first failure:
//!
//! chat scope → bot-is-admin → caller-is-admin/permission →
//! approved-or-admin → feature/disabled-command → rate limit
//!
//! A failing gate produces a [`GateRejection`] whose `Display` text is
//! sent back to the caller; the handler never executes. The feature gate
//! fails open when the settings store is unreachable (configurable via
//! `STRICT_GATES`).

mod limiter;

use std::fmt;

use teloxide::types::{Message, UserId};
use tracing::warn;

use crate::database::{ChatSettingsRepo, UserRepo};
use crate::permissions::{AdminPerm, Permissions};

pub use limiter::{RateLimit, RateLimiter};

/// Which chat types a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatScope {
    #[default]
    Any,
    GroupOnly,
    PrivateOnly,
}

/// Gate metadata attached to a command at registration time.
#[derive(Debug, Clone, Default)]
pub struct GateSet {
    pub scope: ChatScope,
    pub bot_admin: bool,
    pub admin: bool,
    pub admin_perm: Option<AdminPerm>,
    pub approved_or_admin: bool,
    pub feature: Option<&'static str>,
    pub rate_limit: Option<RateLimit>,
}

impl GateSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn group_only(mut self) -> Self {
        self.scope = ChatScope::GroupOnly;
        self
    }

    #[must_use]
    pub fn private_only(mut self) -> Self {
        self.scope = ChatScope::PrivateOnly;
        self
    }

    #[must_use]
    pub fn bot_admin(mut self) -> Self {
        self.bot_admin = true;
        self
    }

    #[must_use]
    pub fn admin(mut self) -> Self {
        self.admin = true;
        self
    }

    /// Admin with a specific right (implies the admin gate).
    #[must_use]
    pub fn perm(mut self, perm: AdminPerm) -> Self {
        self.admin = true;
        self.admin_perm = Some(perm);
        self
    }

    #[must_use]
    pub fn approved_or_admin(mut self) -> Self {
        self.approved_or_admin = true;
        self
    }

    #[must_use]
    pub fn feature(mut self, name: &'static str) -> Self {
        self.feature = Some(name);
        self
    }

    #[must_use]
    pub fn rate_limit(mut self, max_calls: u32, window_secs: u64) -> Self {
        self.rate_limit = Some(RateLimit {
            max_calls,
            window_secs,
        });
        self
    }
}

/// Why a gate refused the command. The display text goes to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRejection {
    GroupOnly,
    PrivateOnly,
    BotNotAdmin,
    NotAdmin,
    MissingPerm(AdminPerm),
    NotApproved,
    FeatureDisabled(&'static str),
    CommandDisabled,
    RateLimited,
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GroupOnly => write!(f, "This command only works in groups."),
            Self::PrivateOnly => write!(f, "This command only works in private chat."),
            Self::BotNotAdmin => write!(f, "I need to be an admin to do that."),
            Self::NotAdmin => write!(f, "You need to be an admin to do that."),
            Self::MissingPerm(perm) => {
                write!(f, "You need the right to {} to do that.", perm.describe())
            }
            Self::NotApproved => write!(f, "Only approved users and admins can do that."),
            Self::FeatureDisabled(name) => write!(f, "{name} is disabled in this chat."),
            Self::CommandDisabled => write!(f, "That command is disabled here."),
            Self::RateLimited => write!(f, "Slow down. Try that again in a little while."),
        }
    }
}

/// Shared state the gate chain reads.
pub struct GateContext<'a> {
    pub permissions: &'a Permissions,
    pub chats: &'a ChatSettingsRepo,
    pub users: &'a UserRepo,
    pub limiter: &'a RateLimiter,
    /// When set, a settings-store failure rejects instead of failing open.
    pub strict: bool,
}

/// Run the gate chain. `Ok(None)` means every gate passed.
///
/// Transport errors from the admin lookups propagate; the caller turns
/// them into a generic failure reply.
pub async fn evaluate(
    gates: &GateSet,
    trigger: &str,
    msg: &Message,
    ctx: &GateContext<'_>,
) -> anyhow::Result<Option<GateRejection>> {
    let chat_id = msg.chat.id;
    let is_group = msg.chat.is_group() || msg.chat.is_supergroup();

    // 1. Chat scope.
    match gates.scope {
        ChatScope::GroupOnly if !is_group => return Ok(Some(GateRejection::GroupOnly)),
        ChatScope::PrivateOnly if !msg.chat.is_private() => {
            return Ok(Some(GateRejection::PrivateOnly));
        }
        _ => {}
    }

    let Some(from) = msg.from.as_ref() else {
        // Anonymous senders never pass the user-specific gates.
        return Ok(None);
    };
    let user_id = from.id;

    // 2. The bot itself must be an admin for actions that need it.
    if gates.bot_admin && is_group && !ctx.permissions.bot_is_admin(chat_id).await? {
        return Ok(Some(GateRejection::BotNotAdmin));
    }

    // 3. Caller adminship and specific rights.
    if gates.admin && is_group {
        let Some(info) = ctx.permissions.get_admin_info(chat_id, user_id).await? else {
            return Ok(Some(GateRejection::NotAdmin));
        };
        if let Some(perm) = gates.admin_perm
            && !info.has(perm)
        {
            return Ok(Some(GateRejection::MissingPerm(perm)));
        }
    }

    // 4. Approved users or admins.
    if gates.approved_or_admin
        && is_group
        && !ctx.permissions.is_admin(chat_id, user_id).await?
        && !is_approved(ctx.users, chat_id.0, user_id).await
    {
        return Ok(Some(GateRejection::NotApproved));
    }

    // 5. Feature flags and per-chat disabled commands. Store errors fail
    // open unless strict mode is on: availability over strictness.
    if is_group && (gates.feature.is_some() || !trigger.is_empty()) {
        match ctx.chats.get(chat_id.0).await {
            Ok(Some(settings)) => {
                if let Some(feature) = gates.feature
                    && !settings.feature_enabled(feature)
                {
                    return Ok(Some(GateRejection::FeatureDisabled(feature)));
                }
                if settings.is_command_disabled(trigger) {
                    return Ok(Some(GateRejection::CommandDisabled));
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(chat_id = chat_id.0, "settings lookup failed in gate chain: {e}");
                if ctx.strict {
                    if let Some(feature) = gates.feature {
                        return Ok(Some(GateRejection::FeatureDisabled(feature)));
                    }
                    return Ok(Some(GateRejection::CommandDisabled));
                }
            }
        }
    }

    // 6. Rate limit, last: rejected calls must not consume quota from
    // any earlier gate's perspective.
    if let Some(limit) = &gates.rate_limit
        && !ctx.limiter.check(user_id, trigger, limit)
    {
        return Ok(Some(GateRejection::RateLimited));
    }

    Ok(None)
}

async fn is_approved(users: &UserRepo, chat_id: i64, user_id: UserId) -> bool {
    match users.get_by_id(user_id.0).await {
        Ok(Some(record)) => record
            .chat_state_ref(chat_id)
            .map(|s| s.approved)
            .unwrap_or(false),
        _ => false,
    }
}
