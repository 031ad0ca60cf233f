//! Filter auto-replies on ordinary messages.

use teloxide::prelude::*;
use teloxide::types::ReplyParameters;

use crate::bot::{AppState, ThrottledBot};

/// Whether `trigger` appears in `text` as a whole word,
/// case-insensitively.
pub fn matches_trigger(text: &str, trigger: &str) -> bool {
    let text = text.to_lowercase();
    let mut start = 0;
    while let Some(pos) = text[start..].find(trigger) {
        let pos = start + pos;
        let end = pos + trigger.len();
        let before_ok = pos == 0
            || !text[..pos]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let after_ok = end == text.len()
            || !text[end..].chars().next().is_some_and(|c| c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = end;
    }
    false
}

/// Reply with the first filter whose trigger appears in the message.
pub async fn check_filters(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let filters = state.filters.list(msg.chat.id.0).await?;
    if filters.is_empty() {
        return Ok(());
    }

    for filter in &filters {
        if matches_trigger(text, &filter.trigger) {
            let response = match msg.from.as_ref() {
                Some(user) => crate::utils::apply_fillings(
                    &filter.response,
                    user,
                    msg.chat.title().unwrap_or(""),
                    None,
                    None,
                ),
                None => filter.response.clone(),
            };
            bot.send_message(msg.chat.id, response)
                .parse_mode(teloxide::types::ParseMode::Html)
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_word_matching() {
        assert!(matches_trigger("hello world", "hello"));
        assert!(matches_trigger("well HELLO there", "hello"));
        assert!(matches_trigger("hello, anyone?", "hello"));
        assert!(!matches_trigger("othello is a play", "hello"));
        assert!(!matches_trigger("hellos all around", "hello"));
        assert!(!matches_trigger("no greeting here", "hello"));
    }

    #[test]
    fn trigger_at_either_end() {
        assert!(matches_trigger("rules", "rules"));
        assert!(matches_trigger("read the rules", "rules"));
        assert!(matches_trigger("rules are rules", "rules"));
    }
}
