//! /help with inline-keyboard category navigation.

use std::sync::Arc;

use teloxide::payloads::{EditMessageTextSetters, SendMessageSetters};
use teloxide::prelude::Requester;
use teloxide::types::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, ReplyParameters,
};

use crate::bot::{AppState, ThrottledBot};
use crate::registry::{Category, CommandContext, CommandRegistry};

pub async fn help(ctx: CommandContext) -> anyhow::Result<()> {
    // The index only names categories; the per-category callbacks check
    // adminship when rendering actual command lists.
    ctx.bot
        .send_message(ctx.chat_id(), index_text())
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(ctx.msg.id))
        .reply_markup(category_keyboard())
        .await?;
    Ok(())
}

fn index_text() -> String {
    "<b>Help</b>\nPick a category to see its commands.".to_string()
}

fn category_keyboard() -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    for pair in Category::ALL.chunks(2) {
        let row: Vec<InlineKeyboardButton> = pair
            .iter()
            .map(|c| InlineKeyboardButton::callback(c.title(), format!("help:{}", c.slug())))
            .collect();
        rows.push(row);
    }
    InlineKeyboardMarkup::new(rows)
}

fn category_text(registry: &CommandRegistry, category: Category, show_admin: bool) -> String {
    let mut text = format!("<b>{} commands</b>", category.title());
    let mut shown = 0;
    for spec in registry.in_category(category) {
        if spec.gates.admin && !show_admin {
            continue;
        }
        text.push_str(&format!(
            "\n<code>{}</code> — {}",
            spec.usage, spec.description
        ));
        shown += 1;
    }
    if shown == 0 {
        text.push_str("\nNothing you can use here.");
    }
    text
}

/// Handle `help:` callback data: category pages and the index.
pub async fn on_help_callback(
    bot: &ThrottledBot,
    query: &CallbackQuery,
    state: &Arc<AppState>,
    data: &str,
) -> anyhow::Result<()> {
    let Some(message) = query.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;

    let (text, keyboard) = if data == "index" {
        (index_text(), category_keyboard())
    } else {
        let Some(category) = Category::from_slug(data) else {
            return Ok(());
        };
        let show_admin = if message.chat().is_group() || message.chat().is_supergroup() {
            state
                .permissions
                .is_admin(chat_id, query.from.id)
                .await
                .unwrap_or(false)
        } else {
            true
        };
        let back = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
            "« Back",
            "help:index",
        )]]);
        (
            category_text(&state.registry, category, show_admin),
            back,
        )
    };

    bot.edit_message_text(chat_id, message.id(), text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    bot.answer_callback_query(query.id.clone()).await?;
    Ok(())
}
