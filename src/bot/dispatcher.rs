//! Dispatcher wiring: shared state and the update-handling schema.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{error, warn};

use crate::audit::AuditSink;
use crate::cache::CacheRegistry;
use crate::config::Config;
use crate::database::{
    ActionLogRepo, CaptchaRepo, ChatSettingsRepo, Database, FederationRepo, FilterRepo, NoteRepo,
    UserRepo,
};
use crate::events::{self, FloodTracker};
use crate::gates::{self, GateContext, RateLimiter};
use crate::handlers;
use crate::permissions::Permissions;
use crate::registry::{parse_command, CommandContext, CommandRegistry};

/// Bot type with the Throttle adaptor for API rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state, one per process.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub cache: Arc<CacheRegistry>,
    pub permissions: Permissions,

    pub chats: ChatSettingsRepo,
    pub users: Arc<UserRepo>,
    pub federations: FederationRepo,
    pub filters: FilterRepo,
    pub notes: NoteRepo,
    pub captcha: CaptchaRepo,

    pub logs: ActionLogRepo,
    pub audit: AuditSink,
    pub registry: Arc<CommandRegistry>,
    pub limiter: Arc<RateLimiter>,
    pub flood: Arc<FloodTracker>,

    pub config: Arc<Config>,
    pub bot_username: String,
}

impl AppState {
    pub fn new(
        bot: ThrottledBot,
        bot_id: UserId,
        db: Arc<Database>,
        cache: Arc<CacheRegistry>,
        config: Arc<Config>,
        registry: CommandRegistry,
        bot_username: String,
    ) -> Self {
        let permissions = Permissions::new(
            bot.clone(),
            cache.clone(),
            config.owner_ids.clone(),
            bot_id,
        );

        let logs = ActionLogRepo::new(&db);
        let audit = AuditSink::new(logs.clone(), bot.clone(), config.dev_chat_id);

        Self {
            permissions,
            chats: ChatSettingsRepo::new(&db, &cache),
            users: Arc::new(UserRepo::new(&db, &cache)),
            federations: FederationRepo::new(&db, &cache),
            filters: FilterRepo::new(&db, &cache),
            notes: NoteRepo::new(&db, &cache),
            captcha: CaptchaRepo::new(&db),
            logs,
            audit,
            registry: Arc::new(registry),
            limiter: Arc::new(RateLimiter::new()),
            flood: Arc::new(FloodTracker::new()),
            config,
            db,
            cache,
            bot_username,
        }
    }

    pub fn is_operator(&self, user_id: u64) -> bool {
        self.config.owner_ids.contains(&user_id)
    }

    fn gate_context(&self) -> GateContext<'_> {
        GateContext {
            permissions: &self.permissions,
            chats: &self.chats,
            users: &self.users,
            limiter: &self.limiter,
            strict: self.config.strict_gates,
        }
    }
}

/// Build the dispatcher over the full schema.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: Arc<AppState>,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Commands first, then the non-command message pipeline; membership and
/// callback updates on their own branches.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    let message_handler = Update::filter_message()
        .inspect_async(track_user)
        .branch(
            dptree::filter(|msg: Message| {
                msg.text().is_some_and(|t| t.trim_start().starts_with('/'))
            })
            .endpoint(dispatch_command),
        )
        .endpoint(events::on_message);

    let member_handler = Update::filter_chat_member().endpoint(events::on_chat_member);

    let callback_handler = Update::filter_callback_query().endpoint(handlers::on_callback);

    dptree::entry()
        .branch(message_handler)
        .branch(member_handler)
        .branch(callback_handler)
}

/// Record sender identity before anything else runs.
async fn track_user(msg: Message, state: Arc<AppState>) {
    if let Some(user) = msg.from.as_ref() {
        state.users.clone().observe_background(user.clone());
    }
}

/// Match a slash command, run the gate chain, then the handler body.
async fn dispatch_command(bot: ThrottledBot, msg: Message, state: Arc<AppState>) -> anyhow::Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some((trigger, args)) = parse_command(text, &state.bot_username) else {
        return Ok(());
    };
    let Some(spec) = state.registry.find(&trigger) else {
        return Ok(());
    };

    match gates::evaluate(&spec.gates, &trigger, &msg, &state.gate_context()).await {
        Ok(None) => {}
        Ok(Some(rejection)) => {
            reply_plain(&bot, &msg, rejection.to_string()).await;
            return Ok(());
        }
        Err(e) => {
            warn!(trigger, "gate evaluation failed: {e:#}");
            reply_plain(&bot, &msg, "Something went wrong, try again later.".into()).await;
            return Ok(());
        }
    }

    let ctx = CommandContext {
        bot: bot.clone(),
        msg: msg.clone(),
        trigger: trigger.clone(),
        args,
        state: state.clone(),
    };

    if let Err(e) = (spec.handler)(ctx).await {
        error!(trigger, chat_id = msg.chat.id.0, "command failed: {e:#}");
        reply_plain(&bot, &msg, "Action failed, try again later.".into()).await;
    }
    Ok(())
}

async fn reply_plain(bot: &ThrottledBot, msg: &Message, text: String) {
    use teloxide::payloads::SendMessageSetters;
    use teloxide::types::ReplyParameters;

    if let Err(e) = bot
        .send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await
    {
        warn!(chat_id = msg.chat.id.0, "failed to send reply: {e}");
    }
}
