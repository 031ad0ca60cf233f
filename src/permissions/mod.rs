//! Admin and operator permission checks.
//!
//! Lookups go through the Telegram API once and are cached for ten
//! minutes; promote/demote handlers invalidate the affected entry so a
//! fresh status is fetched on the next command.

mod checker;

pub use checker::{AdminInfo, AdminPerm, Permissions};
