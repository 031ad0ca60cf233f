//! Filter commands: chat-scoped auto-replies.

use crate::database::models::ChatFilter;
use crate::registry::CommandContext;
use crate::utils::html_escape;

pub async fn filter(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some(sender) = ctx.sender() else {
        return Ok(());
    };

    let mut parts = ctx.args.trim().splitn(2, char::is_whitespace);
    let trigger = parts.next().unwrap_or("").trim();
    let mut response = parts.next().unwrap_or("").trim().to_string();

    // A reply can carry the response instead of inline text.
    if response.is_empty()
        && let Some(reply) = ctx.msg.reply_to_message()
        && let Some(text) = reply.text()
    {
        response = text.to_string();
    }

    if trigger.is_empty() || response.is_empty() {
        ctx.reply("Usage: <code>/filter trigger response</code>, or reply to a message with <code>/filter trigger</code>.")
            .await?;
        return Ok(());
    }

    let record = ChatFilter::new(chat_id.0, trigger, &response, sender.id.0);
    ctx.state.filters.save(&record).await?;

    ctx.reply(format!(
        "I'll reply to <code>{}</code> from now on.",
        html_escape(&record.trigger)
    ))
    .await?;
    Ok(())
}

pub async fn filters(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let filters = ctx.state.filters.list(chat_id.0).await?;

    if filters.is_empty() {
        ctx.reply("No filters in this chat.").await?;
        return Ok(());
    }

    let mut text = String::from("Filters in this chat:");
    for filter in &filters {
        text.push_str(&format!("\n- <code>{}</code>", html_escape(&filter.trigger)));
    }
    ctx.reply(text).await?;
    Ok(())
}

pub async fn stop(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let trigger = ctx.args.trim();
    if trigger.is_empty() {
        ctx.reply("Which filter should I stop? <code>/stop trigger</code>.")
            .await?;
        return Ok(());
    }

    if ctx.state.filters.remove(chat_id.0, trigger).await? {
        ctx.reply(format!(
            "Filter <code>{}</code> removed.",
            html_escape(&trigger.to_lowercase())
        ))
        .await?;
    } else {
        ctx.reply("There's no filter with that trigger.").await?;
    }
    Ok(())
}
