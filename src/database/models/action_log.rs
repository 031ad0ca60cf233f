//! Append-only audit trail of moderation actions.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

/// Kind of moderation action being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Ban,
    Unban,
    Kick,
    Mute,
    Unmute,
    Warn,
    Unwarn,
    Promote,
    Demote,
    Lock,
    Unlock,
    Approve,
    Unapprove,
    FedBan,
    FedUnban,
    Captcha,
    Flood,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Unban => "unban",
            Self::Kick => "kick",
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::Warn => "warn",
            Self::Unwarn => "unwarn",
            Self::Promote => "promote",
            Self::Demote => "demote",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Approve => "approve",
            Self::Unapprove => "unapprove",
            Self::FedBan => "fedban",
            Self::FedUnban => "fedunban",
            Self::Captcha => "captcha",
            Self::Flood => "flood",
        }
    }
}

/// One audit entry. Never updated or deleted after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLogEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub chat_id: i64,
    pub action: ActionKind,
    pub performed_by: u64,
    #[serde(default)]
    pub target_user: Option<u64>,
    #[serde(default)]
    pub reason: Option<String>,
    /// Action-specific extras (duration, revoke_messages, ...).
    #[serde(default)]
    pub metadata: Document,
    pub timestamp: i64,
}

impl ActionLogEntry {
    pub fn new(chat_id: i64, action: ActionKind, performed_by: u64) -> Self {
        Self {
            id: None,
            chat_id,
            action,
            performed_by,
            target_user: None,
            reason: None,
            metadata: Document::new(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    #[must_use]
    pub fn target(mut self, target_user: u64) -> Self {
        self.target_user = Some(target_user);
        self
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn meta(mut self, metadata: Document) -> Self {
        self.metadata = metadata;
        self
    }
}
