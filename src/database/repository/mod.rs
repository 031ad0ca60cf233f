//! Typed repositories over MongoDB collections.

mod action_logs;
mod captcha;
mod chats;
mod federations;
mod filters;
mod users;

pub use action_logs::ActionLogRepo;
pub use captcha::CaptchaRepo;
pub use chats::ChatSettingsRepo;
pub use federations::FederationRepo;
pub use filters::{FilterRepo, NoteRepo};
pub use users::UserRepo;
