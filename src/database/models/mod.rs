//! Persistent document types.

pub mod action_log;
pub mod captcha;
pub mod chat;
pub mod federation;
pub mod filter;
pub mod user;

pub use action_log::{ActionKind, ActionLogEntry};
pub use captcha::PendingCaptcha;
pub use chat::{CaptchaMode, ChatSettings, LockKind, PunishMode};
pub use federation::{FederationBan, FederationRecord};
pub use filter::{ChatFilter, ChatNote};
pub use user::{level_from_xp, xp_for_level, UserChatState, UserRecord, XP_COOLDOWN_SECS};
