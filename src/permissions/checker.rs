//! Admin status checker with caching.

use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMember, ChatMemberKind, UserId};
use tracing::debug;

use crate::bot::ThrottledBot;
use crate::cache::{CachePolicy, CacheRegistry, TypedCache};

/// A specific admin right a command may require beyond plain adminship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminPerm {
    RestrictMembers,
    DeleteMessages,
    PromoteMembers,
    ChangeInfo,
    PinMessages,
    InviteUsers,
}

impl AdminPerm {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::RestrictMembers => "restrict members",
            Self::DeleteMessages => "delete messages",
            Self::PromoteMembers => "promote members",
            Self::ChangeInfo => "change chat info",
            Self::PinMessages => "pin messages",
            Self::InviteUsers => "invite users",
        }
    }
}

/// Snapshot of a member's admin rights.
#[derive(Clone, Debug)]
pub struct AdminInfo {
    pub user_id: UserId,
    pub is_owner: bool,
    pub can_delete_messages: bool,
    pub can_restrict_members: bool,
    pub can_promote_members: bool,
    pub can_change_info: bool,
    pub can_invite_users: bool,
    pub can_pin_messages: bool,
}

impl AdminInfo {
    fn from_chat_member(member: &ChatMember) -> Option<Self> {
        match &member.kind {
            ChatMemberKind::Owner(_) => Some(Self::full(member.user.id)),
            ChatMemberKind::Administrator(admin) => Some(Self {
                user_id: member.user.id,
                is_owner: false,
                can_delete_messages: admin.can_delete_messages,
                can_restrict_members: admin.can_restrict_members,
                can_promote_members: admin.can_promote_members,
                can_change_info: admin.can_change_info,
                can_invite_users: admin.can_invite_users,
                can_pin_messages: admin.can_pin_messages,
            }),
            _ => None,
        }
    }

    /// Full rights; chat owners and bot operators get this.
    fn full(user_id: UserId) -> Self {
        Self {
            user_id,
            is_owner: true,
            can_delete_messages: true,
            can_restrict_members: true,
            can_promote_members: true,
            can_change_info: true,
            can_invite_users: true,
            can_pin_messages: true,
        }
    }

    pub fn has(&self, perm: AdminPerm) -> bool {
        match perm {
            AdminPerm::RestrictMembers => self.can_restrict_members,
            AdminPerm::DeleteMessages => self.can_delete_messages,
            AdminPerm::PromoteMembers => self.can_promote_members,
            AdminPerm::ChangeInfo => self.can_change_info,
            AdminPerm::PinMessages => self.can_pin_messages,
            AdminPerm::InviteUsers => self.can_invite_users,
        }
    }
}

// (chat_id, user_id)
type AdminCacheKey = (i64, u64);

/// Cached admin lookups against the Telegram API.
///
/// Bot operators (OWNER_IDS) bypass every check. Negative results are
/// cached too, so repeated non-admin commands stay cheap.
#[derive(Clone)]
pub struct Permissions {
    bot: ThrottledBot,
    cache: TypedCache<AdminCacheKey, Option<AdminInfo>>,
    owner_ids: Vec<u64>,
    bot_id: UserId,
}

impl Permissions {
    pub fn new(
        bot: ThrottledBot,
        cache_registry: Arc<CacheRegistry>,
        owner_ids: Vec<u64>,
        bot_id: UserId,
    ) -> Self {
        let cache = cache_registry.get_or_create(
            "admin_status",
            CachePolicy::with_capacity(10_000).ttl(Duration::from_secs(600)),
        );

        Self {
            bot,
            cache,
            owner_ids,
            bot_id,
        }
    }

    /// Whether a user is a bot operator.
    #[inline]
    pub fn is_operator(&self, user_id: UserId) -> bool {
        self.owner_ids.contains(&user_id.0)
    }

    /// Admin rights for a user in a chat; `None` for ordinary members.
    pub async fn get_admin_info(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> anyhow::Result<Option<AdminInfo>> {
        if self.is_operator(user_id) {
            return Ok(Some(AdminInfo::full(user_id)));
        }

        let cache_key = (chat_id.0, user_id.0);
        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached);
        }

        debug!(%chat_id, %user_id, "admin cache miss");
        let member = self.bot.get_chat_member(chat_id, user_id).await?;
        let result = AdminInfo::from_chat_member(&member);
        self.cache.insert(cache_key, result.clone());
        Ok(result)
    }

    pub async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<bool> {
        Ok(self.get_admin_info(chat_id, user_id).await?.is_some())
    }

    /// Whether the bot itself holds admin rights in the chat.
    pub async fn bot_is_admin(&self, chat_id: ChatId) -> anyhow::Result<bool> {
        let cache_key = (chat_id.0, self.bot_id.0);
        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached.is_some());
        }

        let member = self.bot.get_chat_member(chat_id, self.bot_id).await?;
        let result = AdminInfo::from_chat_member(&member);
        let is_admin = result.is_some();
        self.cache.insert(cache_key, result);
        Ok(is_admin)
    }

    /// Drop the cached entry after promote/demote so the next check sees
    /// the new status.
    pub fn invalidate(&self, chat_id: ChatId, user_id: UserId) {
        self.cache.invalidate(&(chat_id.0, user_id.0));
        debug!(%chat_id, %user_id, "invalidated admin cache entry");
    }
}
