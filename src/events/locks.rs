//! Lock enforcement: delete messages that hit an enabled lock.

use teloxide::prelude::*;
use teloxide::types::MessageEntityKind;
use tracing::debug;

use crate::bot::{AppState, ThrottledBot};
use crate::database::models::{ChatSettings, LockKind};

/// Lock kinds a message violates, whether or not they are enabled.
fn message_lock_kinds(msg: &Message) -> Vec<LockKind> {
    let mut kinds = Vec::new();
    let mut media = false;

    if msg.sticker().is_some() {
        kinds.push(LockKind::Sticker);
        media = true;
    }
    if msg.animation().is_some() {
        kinds.push(LockKind::Animation);
        media = true;
    }
    if msg.document().is_some() {
        kinds.push(LockKind::Document);
        media = true;
    }
    if msg.photo().is_some() {
        kinds.push(LockKind::Photo);
        media = true;
    }
    if msg.video().is_some() {
        kinds.push(LockKind::Video);
        media = true;
    }
    if msg.audio().is_some() {
        kinds.push(LockKind::Audio);
        media = true;
    }
    if msg.voice().is_some() {
        kinds.push(LockKind::Voice);
        media = true;
    }
    if media {
        kinds.push(LockKind::Media);
    }

    if msg.contact().is_some() {
        kinds.push(LockKind::Contact);
    }
    if msg.location().is_some() {
        kinds.push(LockKind::Location);
    }
    if msg.game().is_some() {
        kinds.push(LockKind::Game);
    }
    if msg.poll().is_some() {
        kinds.push(LockKind::Poll);
    }
    if msg.dice().is_some() {
        kinds.push(LockKind::Dice);
    }
    if msg.forward_origin().is_some() {
        kinds.push(LockKind::Forward);
    }
    if msg.reply_markup().is_some() {
        kinds.push(LockKind::Button);
    }
    if msg.via_bot.is_some() {
        kinds.push(LockKind::Inline);
    }
    if msg.from.as_ref().is_some_and(|u| u.is_bot) {
        kinds.push(LockKind::Bot);
    }

    if let Some(entities) = msg.entities() {
        for entity in entities {
            match &entity.kind {
                MessageEntityKind::Url | MessageEntityKind::TextLink { .. } => {
                    kinds.push(LockKind::Url)
                }
                MessageEntityKind::Email => kinds.push(LockKind::Email),
                MessageEntityKind::PhoneNumber => kinds.push(LockKind::Phone),
                _ => {}
            }
        }
    }

    if msg.text().is_some_and(contains_rtl) {
        kinds.push(LockKind::Rtl);
    }

    kinds.dedup();
    kinds
}

/// Right-to-left scripts (Hebrew, Arabic and its extensions).
fn contains_rtl(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{0590}'..='\u{05FF}'
            | '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}'
        )
    })
}

/// The first enabled lock a message violates, if any.
pub fn violated_lock(msg: &Message, settings: &ChatSettings) -> Option<LockKind> {
    message_lock_kinds(msg)
        .into_iter()
        .find(|kind| settings.is_locked(*kind))
}

/// Delete the message when it violates a lock. Returns true when the
/// message was removed (so later stages skip it).
pub async fn enforce_locks(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    settings: &ChatSettings,
) -> anyhow::Result<bool> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(false);
    };

    let Some(kind) = violated_lock(msg, settings) else {
        return Ok(false);
    };

    // Admins and operators post through locks.
    if state.is_operator(user.id.0)
        || state
            .permissions
            .is_admin(msg.chat.id, user.id)
            .await
            .unwrap_or(false)
    {
        return Ok(false);
    }

    debug!(
        chat_id = msg.chat.id.0,
        user_id = user.id.0,
        lock = kind.as_str(),
        "deleting message for lock violation"
    );
    // Best effort: the message may already be gone.
    let _ = bot.delete_message(msg.chat.id, msg.id).await;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rtl_detection() {
        assert!(contains_rtl("שלום"));
        assert!(contains_rtl("مرحبا"));
        assert!(contains_rtl("mixed مرحبا text"));
        assert!(!contains_rtl("plain ascii"));
        assert!(!contains_rtl("ümläuts événement"));
    }
}
