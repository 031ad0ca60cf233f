//! Command registration and dispatch.
//!
//! Every command is registered explicitly at startup with its triggers,
//! help metadata, gates, and handler. Registration is validated as it
//! happens: a duplicate trigger or missing metadata is a typed error and
//! the process exits instead of silently shadowing a command.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use teloxide::types::{ChatId, Message, User};
use thiserror::Error;

use crate::bot::{AppState, ThrottledBot};
use crate::gates::GateSet;

/// Everything a command body needs.
#[derive(Clone)]
pub struct CommandContext {
    pub bot: ThrottledBot,
    pub msg: Message,
    /// The trigger that matched, lowercased, without `/` or `@botname`.
    pub trigger: String,
    /// Raw text after the command token.
    pub args: String,
    pub state: Arc<AppState>,
}

impl CommandContext {
    pub fn chat_id(&self) -> ChatId {
        self.msg.chat.id
    }

    pub fn sender(&self) -> Option<&User> {
        self.msg.from.as_ref()
    }

    pub fn chat_title(&self) -> &str {
        self.msg.chat.title().unwrap_or("this chat")
    }

    /// Reply in HTML to the invoking message.
    pub async fn reply(&self, text: impl Into<String>) -> anyhow::Result<()> {
        use teloxide::payloads::SendMessageSetters;
        use teloxide::prelude::Requester;
        use teloxide::types::{ParseMode, ReplyParameters};

        self.bot
            .send_message(self.chat_id(), text.into())
            .parse_mode(ParseMode::Html)
            .reply_parameters(ReplyParameters::new(self.msg.id))
            .await?;
        Ok(())
    }
}

/// Boxed async command handler.
pub type Handler = Arc<dyn Fn(CommandContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wrap an async fn into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

/// Help categories, in the order they appear in /help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Admin,
    Moderation,
    Warns,
    Approval,
    Locks,
    Filters,
    Notes,
    Federations,
    Disabling,
    Misc,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Admin,
        Category::Moderation,
        Category::Warns,
        Category::Approval,
        Category::Locks,
        Category::Filters,
        Category::Notes,
        Category::Federations,
        Category::Disabling,
        Category::Misc,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Moderation => "Moderation",
            Self::Warns => "Warnings",
            Self::Approval => "Approval",
            Self::Locks => "Locks",
            Self::Filters => "Filters",
            Self::Notes => "Notes",
            Self::Federations => "Federations",
            Self::Disabling => "Disabling",
            Self::Misc => "Misc",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Moderation => "moderation",
            Self::Warns => "warns",
            Self::Approval => "approval",
            Self::Locks => "locks",
            Self::Filters => "filters",
            Self::Notes => "notes",
            Self::Federations => "federations",
            Self::Disabling => "disabling",
            Self::Misc => "misc",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.slug() == slug)
    }
}

/// One registered command.
#[derive(Clone)]
pub struct CommandSpec {
    pub triggers: Vec<&'static str>,
    pub description: &'static str,
    pub usage: &'static str,
    pub category: Category,
    pub gates: GateSet,
    /// Hidden commands never appear in /help (e.g. /start).
    pub hidden: bool,
    pub handler: Handler,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("triggers", &self.triggers)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Registration-time validation failures. Any of these is fatal at
/// startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command registered with no triggers")]
    NoTriggers,
    #[error("trigger '{0}' registered twice")]
    DuplicateTrigger(String),
    #[error("trigger '{0}' has no description")]
    MissingDescription(String),
    #[error("trigger '{0}' has no usage line")]
    MissingUsage(String),
}

/// The registration table. Insertion order is preserved for help output.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<CommandSpec>,
    by_trigger: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: CommandSpec) -> Result<(), RegistryError> {
        let Some(primary) = spec.triggers.first() else {
            return Err(RegistryError::NoTriggers);
        };
        if spec.description.trim().is_empty() {
            return Err(RegistryError::MissingDescription(primary.to_string()));
        }
        if spec.usage.trim().is_empty() {
            return Err(RegistryError::MissingUsage(primary.to_string()));
        }

        let index = self.commands.len();
        for trigger in &spec.triggers {
            let key = trigger.to_lowercase();
            if self.by_trigger.contains_key(&key) {
                return Err(RegistryError::DuplicateTrigger(key));
            }
            self.by_trigger.insert(key, index);
        }
        self.commands.push(spec);
        Ok(())
    }

    pub fn find(&self, trigger: &str) -> Option<&CommandSpec> {
        self.by_trigger
            .get(&trigger.to_lowercase())
            .map(|&i| &self.commands[i])
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.iter()
    }

    /// Commands in a category, in registration order.
    pub fn in_category(&self, category: Category) -> Vec<&CommandSpec> {
        self.commands
            .iter()
            .filter(|c| c.category == category && !c.hidden)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Split command text into `(trigger, args)`.
///
/// The leading `/` is required; an `@botname` suffix is accepted only
/// when it names this bot (case-insensitive). The trigger comes back
/// lowercased.
pub fn parse_command(text: &str, bot_username: &str) -> Option<(String, String)> {
    let text = text.trim_start();
    let rest = text.strip_prefix('/')?;
    if rest.is_empty() {
        return None;
    }

    let (token, args) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim_start()),
        None => (rest, ""),
    };

    let trigger = match token.split_once('@') {
        Some((cmd, addressee)) => {
            if !addressee.eq_ignore_ascii_case(bot_username) {
                return None;
            }
            cmd
        }
        None => token,
    };

    if trigger.is_empty() {
        return None;
    }
    Some((trigger.to_lowercase(), args.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        handler(|_ctx| async { Ok(()) })
    }

    fn spec(triggers: Vec<&'static str>, category: Category) -> CommandSpec {
        CommandSpec {
            triggers,
            description: "test command",
            usage: "/test",
            category,
            gates: GateSet::new(),
            hidden: false,
            handler: noop(),
        }
    }

    #[test]
    fn duplicate_trigger_is_an_error() {
        let mut registry = CommandRegistry::new();
        registry.register(spec(vec!["ban"], Category::Moderation)).unwrap();

        let err = registry
            .register(spec(vec!["ban"], Category::Misc))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTrigger("ban".to_string()));

        // Aliases collide too, even across casing.
        let err = registry
            .register(spec(vec!["kick", "BAN"], Category::Moderation))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTrigger("ban".to_string()));
    }

    #[test]
    fn metadata_is_required() {
        let mut registry = CommandRegistry::new();
        let mut bad = spec(vec!["ban"], Category::Moderation);
        bad.description = "  ";
        assert_eq!(
            registry.register(bad).unwrap_err(),
            RegistryError::MissingDescription("ban".to_string())
        );

        let mut bad = spec(vec!["ban"], Category::Moderation);
        bad.usage = "";
        assert_eq!(
            registry.register(bad).unwrap_err(),
            RegistryError::MissingUsage("ban".to_string())
        );

        assert_eq!(
            registry.register(spec(vec![], Category::Misc)).unwrap_err(),
            RegistryError::NoTriggers
        );
    }

    #[test]
    fn lookup_is_case_insensitive_and_covers_aliases() {
        let mut registry = CommandRegistry::new();
        registry
            .register(spec(vec!["ban", "banhammer"], Category::Moderation))
            .unwrap();

        assert!(registry.find("ban").is_some());
        assert!(registry.find("BAN").is_some());
        assert!(registry.find("banhammer").is_some());
        assert!(registry.find("unban").is_none());
    }

    #[test]
    fn category_listing_preserves_registration_order() {
        let mut registry = CommandRegistry::new();
        registry.register(spec(vec!["ban"], Category::Moderation)).unwrap();
        registry.register(spec(vec!["mute"], Category::Moderation)).unwrap();
        registry.register(spec(vec!["kick"], Category::Moderation)).unwrap();
        registry.register(spec(vec!["id"], Category::Misc)).unwrap();

        let moderation: Vec<&str> = registry
            .in_category(Category::Moderation)
            .iter()
            .map(|c| c.triggers[0])
            .collect();
        assert_eq!(moderation, vec!["ban", "mute", "kick"]);
    }

    #[test]
    fn hidden_commands_stay_out_of_listings() {
        let mut registry = CommandRegistry::new();
        let mut start = spec(vec!["start"], Category::Misc);
        start.hidden = true;
        registry.register(start).unwrap();

        assert!(registry.find("start").is_some());
        assert!(registry.in_category(Category::Misc).is_empty());
    }

    #[test]
    fn command_parsing() {
        assert_eq!(
            parse_command("/ban @alice spamming", "vigilbot"),
            Some(("ban".to_string(), "@alice spamming".to_string()))
        );
        assert_eq!(
            parse_command("/BAN", "vigilbot"),
            Some(("ban".to_string(), String::new()))
        );
        assert_eq!(
            parse_command("/ban@VigilBot 123", "vigilbot"),
            Some(("ban".to_string(), "123".to_string()))
        );
        // Addressed to some other bot.
        assert_eq!(parse_command("/ban@otherbot 123", "vigilbot"), None);
        assert_eq!(parse_command("not a command", "vigilbot"), None);
        assert_eq!(parse_command("/", "vigilbot"), None);
    }
}
