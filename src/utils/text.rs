//! Message text helpers: placeholder fillings, escaping, chunking.

use teloxide::types::User;

/// Telegram's hard limit on message text length.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Escape HTML special characters for `ParseMode::Html`.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// An HTML mention link for a user.
pub fn mention(user_id: u64, name: &str) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user_id,
        html_escape(name)
    )
}

/// Substitute named placeholders into a greeting/level-up template.
///
/// Supported: `{first}`, `{last}`, `{fullname}`, `{username}`,
/// `{mention}`, `{id}`, `{chatname}`, `{count}`, `{level}`.
pub fn apply_fillings(
    template: &str,
    user: &User,
    chat_name: &str,
    count: Option<u64>,
    level: Option<u32>,
) -> String {
    let first = &user.first_name;
    let last = user.last_name.as_deref().unwrap_or("");
    let fullname = if last.is_empty() {
        first.clone()
    } else {
        format!("{} {}", first, last)
    };
    let username = user
        .username
        .as_ref()
        .map(|u| format!("@{}", u))
        .unwrap_or_else(|| mention(user.id.0, first));

    template
        .replace("{first}", &html_escape(first))
        .replace("{last}", &html_escape(last))
        .replace("{fullname}", &html_escape(&fullname))
        .replace("{username}", &username)
        .replace("{mention}", &mention(user.id.0, first))
        .replace("{id}", &user.id.to_string())
        .replace("{chatname}", &html_escape(chat_name))
        .replace("{count}", &count.map(|c| c.to_string()).unwrap_or_default())
        .replace("{level}", &level.map(|l| l.to_string()).unwrap_or_default())
}

/// Split text into chunks no longer than `limit`, preferring line breaks.
///
/// A single line longer than the limit is split mid-line on a char
/// boundary.
pub fn split_chunks(text: &str, limit: usize) -> Vec<String> {
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if current.len() + line.len() > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            if line.len() > limit {
                // Oversized line: hard-split on char boundaries.
                let mut rest = line;
                while rest.len() > limit {
                    let mut cut = limit;
                    while !rest.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    let (head, tail) = rest.split_at(cut);
                    chunks.push(head.to_string());
                    rest = tail;
                }
                current.push_str(rest);
                continue;
            }
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html() {
        assert_eq!(html_escape("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_chunks("hello", 100), vec!["hello"]);
    }

    #[test]
    fn splits_on_line_boundaries() {
        let text = "aaaa\nbbbb\ncccc\n";
        let chunks = split_chunks(text, 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n", "cccc\n"]);
        assert!(chunks.iter().all(|c| c.len() <= 10));
    }

    #[test]
    fn hard_splits_oversized_lines() {
        let text = "x".repeat(25);
        let chunks = split_chunks(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), text);
    }
}
