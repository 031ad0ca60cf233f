//! Target user resolution for moderation commands.
//!
//! A command like `/ban` can name its target several ways; resolution
//! tries them in a fixed order:
//!
//! 1. the replied-to message's author
//! 2. a numeric user ID argument
//! 3. a text-mention entity (users without a username)
//! 4. a markdown mention `[Name](tg://user?id=N)`
//! 5. an `@username` argument, resolved from previously seen users
//!
//! An `@username` the bot has never seen still yields a descriptor, but
//! one without an ID, which can be displayed but not acted on.

use teloxide::types::{Message, MessageEntityKind, User, UserId};
use thiserror::Error;

use crate::database::UserRepo;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("I can't find a user in that. Reply to a message or pass an ID, @username, or mention.")]
    NoTarget,
    #[error("@{0} isn't a valid username.")]
    BadUsername(String),
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

/// What we know about a target user. `id` may be absent when only an
/// unseen `@username` was given.
#[derive(Debug, Clone)]
pub struct UserDescriptor {
    pub id: Option<UserId>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl UserDescriptor {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: Some(user.id),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.as_ref().map(|u| u.to_lowercase()),
        }
    }

    fn from_id(id: u64) -> Self {
        Self {
            id: Some(UserId(id)),
            first_name: format!("User {id}"),
            last_name: None,
            username: None,
        }
    }

    /// Whether this descriptor can be the subject of an API action.
    pub fn actionable(&self) -> bool {
        self.id.is_some()
    }

    pub fn display_name(&self) -> String {
        if let Some(username) = &self.username {
            return format!("@{username}");
        }
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }

    /// HTML mention link when the ID is known, plain name otherwise.
    pub fn mention(&self) -> String {
        match self.id {
            Some(id) => crate::utils::mention(id.0, &self.first_name),
            None => crate::utils::html_escape(&self.display_name()),
        }
    }
}

/// A resolved target plus the arguments left over (usually the reason).
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub user: UserDescriptor,
    pub remainder: String,
}

/// Telegram usernames: 5-32 chars of letters, digits, underscores.
pub fn valid_username(username: &str) -> bool {
    (5..=32).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a leading `[Name](tg://user?id=N)` mention. Returns the name,
/// the user id, and the byte offset just past the closing paren.
fn parse_markdown_mention(input: &str) -> Option<(String, u64, usize)> {
    let rest = input.strip_prefix('[')?;
    let close = rest.find(']')?;
    let name = &rest[..close];
    let after = rest[close + 1..].strip_prefix("(tg://user?id=")?;
    let paren = after.find(')')?;
    let id: u64 = after[..paren].parse().ok()?;
    // 1 for '[', close, 1 for ']', 14 for "(tg://user?id=", paren, 1 for ')'
    let consumed = 1 + close + 1 + 14 + paren + 1;
    Some((name.to_string(), id, consumed))
}

/// The first text-mention entity in the message, if any.
fn text_mention(msg: &Message) -> Option<&User> {
    msg.entities()?.iter().find_map(|e| match &e.kind {
        MessageEntityKind::TextMention { user } => Some(user),
        _ => None,
    })
}

fn split_first_token(args: &str) -> (&str, &str) {
    let args = args.trim_start();
    match args.find(char::is_whitespace) {
        Some(idx) => (&args[..idx], args[idx..].trim_start()),
        None => (args, ""),
    }
}

/// Resolve the target of a command from the message and its arguments.
pub async fn resolve_target(
    msg: &Message,
    args: &str,
    users: &UserRepo,
) -> Result<ResolvedTarget, ResolveError> {
    // 1. Reply wins; the whole argument string becomes the remainder.
    if let Some(reply) = msg.reply_to_message()
        && let Some(from) = reply.from.as_ref()
    {
        return Ok(ResolvedTarget {
            user: UserDescriptor::from_user(from),
            remainder: args.trim().to_string(),
        });
    }

    let args = args.trim();
    if args.is_empty() {
        return Err(ResolveError::NoTarget);
    }

    let (token, rest) = split_first_token(args);

    // 2. Bare numeric ID.
    if let Ok(id) = token.parse::<u64>() {
        let mut descriptor = UserDescriptor::from_id(id);
        if let Some(record) = users.get_by_id(id).await.map_err(ResolveError::Db)? {
            descriptor.first_name = record.first_name.clone();
            descriptor.last_name = record.last_name.clone();
            descriptor.username = record.username.clone();
            if descriptor.first_name.is_empty() {
                descriptor.first_name = format!("User {id}");
            }
        }
        return Ok(ResolvedTarget {
            user: descriptor,
            remainder: rest.to_string(),
        });
    }

    // 3. Text-mention entity (no-username users mentioned by name).
    if let Some(user) = text_mention(msg) {
        return Ok(ResolvedTarget {
            user: UserDescriptor::from_user(user),
            remainder: rest.to_string(),
        });
    }

    // 4. Raw markdown mention pasted as text.
    if let Some((name, id, consumed)) = parse_markdown_mention(args) {
        let mut descriptor = UserDescriptor::from_id(id);
        descriptor.first_name = name;
        return Ok(ResolvedTarget {
            user: descriptor,
            remainder: args[consumed..].trim_start().to_string(),
        });
    }

    // 5. @username, from the user store.
    if let Some(username) = token.strip_prefix('@') {
        if !valid_username(username) {
            return Err(ResolveError::BadUsername(username.to_string()));
        }
        let descriptor = match users
            .get_by_username(username)
            .await
            .map_err(ResolveError::Db)?
        {
            Some(record) => UserDescriptor {
                id: Some(UserId(record.user_id)),
                first_name: record.first_name.clone(),
                last_name: record.last_name.clone(),
                username: record.username.clone(),
            },
            // Unknown username: displayable, not actionable.
            None => UserDescriptor {
                id: None,
                first_name: String::new(),
                last_name: None,
                username: Some(username.to_lowercase()),
            },
        };
        return Ok(ResolvedTarget {
            user: descriptor,
            remainder: rest.to_string(),
        });
    }

    Err(ResolveError::NoTarget)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_validation() {
        assert!(valid_username("alice_99"));
        assert!(valid_username("abcde"));
        assert!(!valid_username("abcd")); // too short
        assert!(!valid_username(&"a".repeat(33)));
        assert!(!valid_username("bad-name"));
        assert!(!valid_username("has space"));
    }

    #[test]
    fn markdown_mention_parsing() {
        let (name, id, consumed) =
            parse_markdown_mention("[Alice](tg://user?id=12345) being rude").unwrap();
        assert_eq!(name, "Alice");
        assert_eq!(id, 12345);
        assert_eq!(&"[Alice](tg://user?id=12345) being rude"[consumed..], " being rude");

        assert!(parse_markdown_mention("[Alice](https://example.com)").is_none());
        assert!(parse_markdown_mention("[Alice](tg://user?id=oops)").is_none());
        assert!(parse_markdown_mention("no mention here").is_none());
    }

    #[test]
    fn first_token_split() {
        assert_eq!(split_first_token("123 spamming"), ("123", "spamming"));
        assert_eq!(split_first_token("@alice"), ("@alice", ""));
        assert_eq!(split_first_token("  @alice  reason  "), ("@alice", "reason  "));
    }

    #[test]
    fn descriptor_without_id_is_not_actionable() {
        let descriptor = UserDescriptor {
            id: None,
            first_name: String::new(),
            last_name: None,
            username: Some("ghost_user".to_string()),
        };
        assert!(!descriptor.actionable());
        assert_eq!(descriptor.display_name(), "@ghost_user");
    }
}
