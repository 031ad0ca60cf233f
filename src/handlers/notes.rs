//! Note commands: save and recall chat-scoped snippets.

use crate::database::models::ChatNote;
use crate::registry::CommandContext;
use crate::utils::html_escape;

pub async fn save(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let Some(sender) = ctx.sender() else {
        return Ok(());
    };

    let mut parts = ctx.args.trim().splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").trim();
    let mut content = parts.next().unwrap_or("").trim().to_string();

    if content.is_empty()
        && let Some(reply) = ctx.msg.reply_to_message()
        && let Some(text) = reply.text()
    {
        content = text.to_string();
    }

    if name.is_empty() || content.is_empty() {
        ctx.reply("Usage: <code>/save name content</code>, or reply to a message with <code>/save name</code>.")
            .await?;
        return Ok(());
    }

    let note = ChatNote::new(chat_id.0, name, &content, sender.id.0);
    ctx.state.notes.save(&note).await?;

    ctx.reply(format!(
        "Saved note <code>{}</code>. Get it with <code>/get {}</code>.",
        html_escape(&note.name),
        html_escape(&note.name)
    ))
    .await?;
    Ok(())
}

pub async fn get(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let name = ctx.args.trim();
    if name.is_empty() {
        ctx.reply("Which note? <code>/get name</code>.").await?;
        return Ok(());
    }

    match ctx.state.notes.get(chat_id.0, name).await? {
        Some(note) => {
            // Notes render with fillings just like greetings do.
            let text = match ctx.sender() {
                Some(user) => crate::utils::apply_fillings(
                    &note.content,
                    user,
                    ctx.chat_title(),
                    None,
                    None,
                ),
                None => note.content.clone(),
            };
            ctx.reply(text).await?;
        }
        None => {
            ctx.reply("There's no note with that name.").await?;
        }
    }
    Ok(())
}

pub async fn notes(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let notes = ctx.state.notes.list(chat_id.0).await?;

    if notes.is_empty() {
        ctx.reply("No notes in this chat.").await?;
        return Ok(());
    }

    let mut text = String::from("Notes in this chat:");
    for note in &notes {
        text.push_str(&format!("\n- <code>{}</code>", html_escape(&note.name)));
    }
    ctx.reply(text).await?;
    Ok(())
}

pub async fn clear(ctx: CommandContext) -> anyhow::Result<()> {
    let chat_id = ctx.chat_id();
    let name = ctx.args.trim();
    if name.is_empty() {
        ctx.reply("Which note should I clear? <code>/clear name</code>.")
            .await?;
        return Ok(());
    }

    if ctx.state.notes.remove(chat_id.0, name).await? {
        ctx.reply(format!(
            "Note <code>{}</code> cleared.",
            html_escape(&name.to_lowercase())
        ))
        .await?;
    } else {
        ctx.reply("There's no note with that name.").await?;
    }
    Ok(())
}
