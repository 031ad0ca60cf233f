//! Chat settings repository.
//!
//! Cache-first reads with a TTL so per-chat settings survive restarts but
//! the hot path rarely touches MongoDB.

use std::time::Duration;

use anyhow::Result;
use mongodb::bson::doc;
use mongodb::Collection;
use tracing::debug;

use super::super::models::ChatSettings;
use super::super::Database;
use crate::cache::{CachePolicy, CacheRegistry, TypedCache};

pub struct ChatSettingsRepo {
    collection: Collection<ChatSettings>,
    cache: TypedCache<i64, ChatSettings>,
}

impl ChatSettingsRepo {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        let settings_cache = cache.get_or_create(
            "chat_settings",
            CachePolicy::with_capacity(1_000).ttl(Duration::from_secs(300)),
        );

        Self {
            collection: db.collection("chats"),
            cache: settings_cache,
        }
    }

    /// Get settings for a chat, creating the default document on first
    /// contact with a chat the bot has never seen.
    pub async fn get_or_create(&self, chat_id: i64, title: &str) -> Result<ChatSettings> {
        if let Some(mut settings) = self.get(chat_id).await? {
            if !title.is_empty() && settings.title != title {
                settings.title = title.to_string();
                settings.touch();
                self.save(&settings).await?;
            }
            return Ok(settings);
        }

        let settings = ChatSettings::new(chat_id, "supergroup", title);
        self.save(&settings).await?;
        debug!(chat_id, "created default chat settings");
        Ok(settings)
    }

    pub async fn get(&self, chat_id: i64) -> Result<Option<ChatSettings>> {
        if let Some(settings) = self.cache.get(&chat_id) {
            return Ok(Some(settings));
        }

        let settings = self
            .collection
            .find_one(doc! { "chat_id": chat_id })
            .await?;

        if let Some(s) = &settings {
            self.cache.insert(chat_id, s.clone());
        }

        Ok(settings)
    }

    /// Upsert the full document and refresh the cache.
    pub async fn save(&self, settings: &ChatSettings) -> Result<()> {
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(doc! { "chat_id": settings.chat_id }, settings)
            .with_options(options)
            .await?;

        self.cache.insert(settings.chat_id, settings.clone());

        Ok(())
    }

    /// All chats enrolled in a federation.
    pub async fn chats_in_federation(&self, fed_id: &str) -> Result<Vec<ChatSettings>> {
        use futures::TryStreamExt;

        let cursor = self.collection.find(doc! { "fed_id": fed_id }).await?;
        Ok(cursor.try_collect().await?)
    }
}

impl Clone for ChatSettingsRepo {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            cache: self.cache.clone(),
        }
    }
}
