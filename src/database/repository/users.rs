//! User repository with dual-index caching.
//!
//! Records are cached by user ID (primary) and by lowercased username, so
//! `@username` targets resolve without a database round trip once seen.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mongodb::bson::doc;
use mongodb::Collection;
use teloxide::types::User;
use tokio::spawn;
use tracing::{debug, warn};

use super::super::models::UserRecord;
use super::super::Database;
use crate::cache::{CachePolicy, CacheRegistry, TypedCache};

pub struct UserRepo {
    collection: Collection<UserRecord>,
    cache_by_id: TypedCache<u64, UserRecord>,
    // username (lowercase) -> user_id
    cache_by_username: TypedCache<String, u64>,
}

impl UserRepo {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        let cache_by_id = cache.get_or_create(
            "users_by_id",
            CachePolicy::with_capacity(10_000).ttl(Duration::from_secs(3600)),
        );

        // Shorter TTL: usernames change out from under us.
        let cache_by_username = cache.get_or_create(
            "users_by_username",
            CachePolicy::with_capacity(10_000).ttl(Duration::from_secs(1800)),
        );

        Self {
            collection: db.collection("users"),
            cache_by_id,
            cache_by_username,
        }
    }

    /// Get a user's record, creating an empty one if unseen.
    pub async fn get_or_create(&self, user_id: u64) -> Result<UserRecord> {
        if let Some(record) = self.get_by_id(user_id).await? {
            return Ok(record);
        }

        let record = UserRecord::new(user_id);
        self.save(&record).await?;
        Ok(record)
    }

    pub async fn get_by_id(&self, user_id: u64) -> Result<Option<UserRecord>> {
        if let Some(record) = self.cache_by_id.get(&user_id) {
            return Ok(Some(record));
        }

        let result = self
            .collection
            .find_one(doc! { "user_id": user_id as i64 })
            .await?;

        if let Some(record) = &result {
            self.index(record);
        }

        Ok(result)
    }

    /// Look up by username, case-insensitive, with or without the leading @.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let username_lower = username.trim_start_matches('@').to_lowercase();

        if let Some(user_id) = self.cache_by_username.get(&username_lower) {
            if let Some(record) = self.cache_by_id.get(&user_id) {
                return Ok(Some(record));
            }
            return self.get_by_id(user_id).await;
        }

        let result = self
            .collection
            .find_one(doc! { "username": &username_lower })
            .await?;

        if let Some(record) = &result {
            self.index(record);
        }

        Ok(result)
    }

    /// Upsert the full record and refresh both cache indexes.
    pub async fn save(&self, record: &UserRecord) -> Result<()> {
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(doc! { "user_id": record.user_id as i64 }, record)
            .with_options(options)
            .await?;

        self.index(record);
        Ok(())
    }

    /// Record identity from an update the bot observed. Skips the write
    /// when nothing changed since the cached copy.
    pub async fn observe(&self, user: &User) -> Result<()> {
        let user_id = user.id.0;

        let (mut record, existed) = match self.get_by_id(user_id).await? {
            Some(record) => (record, true),
            None => (UserRecord::new(user_id), false),
        };

        let old_username = record.username.clone();
        if !record.sync_identity(user) && existed {
            return Ok(());
        }

        if let Some(old) = old_username
            && record.username.as_deref() != Some(old.as_str())
        {
            self.cache_by_username.invalidate(&old);
        }

        self.save(&record).await?;
        debug!(user_id, username = ?record.username, "observed user");
        Ok(())
    }

    /// Fire-and-forget [`observe`](Self::observe) off the hot path.
    pub fn observe_background(self: Arc<Self>, user: User) {
        spawn(async move {
            if let Err(e) = self.observe(&user).await {
                warn!("failed to record user {}: {e}", user.id);
            }
        });
    }

    fn index(&self, record: &UserRecord) {
        self.cache_by_id.insert(record.user_id, record.clone());
        if let Some(username) = &record.username {
            self.cache_by_username.insert(username.clone(), record.user_id);
        }
    }
}

impl Clone for UserRepo {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            cache_by_id: self.cache_by_id.clone(),
            cache_by_username: self.cache_by_username.clone(),
        }
    }
}
