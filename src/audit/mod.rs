//! Best-effort audit logging of moderation actions.
//!
//! `record` never fails the action that called it: store writes and the
//! operator notification run under a five-second timeout, and any
//! failure is logged. Bot API calls elsewhere are bounded by the
//! transport client's own request timeout rather than a per-call one.

use std::time::Duration;

use teloxide::prelude::Requester;
use teloxide::types::ChatId;
use tracing::warn;

use crate::bot::ThrottledBot;
use crate::database::models::ActionLogEntry;
use crate::database::ActionLogRepo;

const RECORD_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AuditSink {
    repo: ActionLogRepo,
    bot: ThrottledBot,
    dev_chat: Option<ChatId>,
}

impl AuditSink {
    pub fn new(repo: ActionLogRepo, bot: ThrottledBot, dev_chat: Option<ChatId>) -> Self {
        Self {
            repo,
            bot,
            dev_chat,
        }
    }

    /// Append an entry. Failures are swallowed after reporting.
    pub async fn record(&self, entry: ActionLogEntry) {
        let outcome = tokio::time::timeout(RECORD_TIMEOUT, self.repo.append(&entry)).await;

        let error = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => format!("audit write failed: {e}"),
            Err(_) => "audit write timed out".to_string(),
        };

        warn!(
            chat_id = entry.chat_id,
            action = entry.action.as_str(),
            "{error}"
        );

        if let Some(dev_chat) = self.dev_chat {
            let note = format!(
                "⚠️ {error} (chat {}, action {})",
                entry.chat_id,
                entry.action.as_str()
            );
            match tokio::time::timeout(RECORD_TIMEOUT, self.bot.send_message(dev_chat, note)).await
            {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("failed to notify operator chat: {e}"),
                Err(_) => warn!("operator chat notification timed out"),
            }
        }
    }
}
