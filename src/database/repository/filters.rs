//! Filter and note repositories.
//!
//! Both are chat-scoped trigger documents with a unique compound index;
//! saving an existing trigger replaces the previous response.

use std::time::Duration;

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Collection;

use super::super::models::{ChatFilter, ChatNote};
use super::super::Database;
use crate::cache::{CachePolicy, CacheRegistry, TypedCache};

pub struct FilterRepo {
    collection: Collection<ChatFilter>,
    // Full filter list per chat; invalidated on any write.
    cache: TypedCache<i64, Vec<ChatFilter>>,
}

impl FilterRepo {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        let list_cache = cache.get_or_create(
            "chat_filters",
            CachePolicy::with_capacity(1_000).ttl(Duration::from_secs(300)),
        );

        Self {
            collection: db.collection("filters"),
            cache: list_cache,
        }
    }

    pub async fn list(&self, chat_id: i64) -> Result<Vec<ChatFilter>> {
        if let Some(filters) = self.cache.get(&chat_id) {
            return Ok(filters);
        }

        let cursor = self.collection.find(doc! { "chat_id": chat_id }).await?;
        let filters: Vec<ChatFilter> = cursor.try_collect().await?;
        self.cache.insert(chat_id, filters.clone());
        Ok(filters)
    }

    /// Add or replace a filter for its trigger.
    pub async fn save(&self, filter: &ChatFilter) -> Result<()> {
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(
                doc! { "chat_id": filter.chat_id, "trigger": &filter.trigger },
                filter,
            )
            .with_options(options)
            .await?;

        self.cache.invalidate(&filter.chat_id);
        Ok(())
    }

    pub async fn remove(&self, chat_id: i64, trigger: &str) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "chat_id": chat_id, "trigger": trigger.to_lowercase() })
            .await?;
        self.cache.invalidate(&chat_id);
        Ok(result.deleted_count > 0)
    }
}

impl Clone for FilterRepo {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            cache: self.cache.clone(),
        }
    }
}

pub struct NoteRepo {
    collection: Collection<ChatNote>,
    cache: TypedCache<i64, Vec<ChatNote>>,
}

impl NoteRepo {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        let list_cache = cache.get_or_create(
            "chat_notes",
            CachePolicy::with_capacity(1_000).ttl(Duration::from_secs(300)),
        );

        Self {
            collection: db.collection("notes"),
            cache: list_cache,
        }
    }

    pub async fn list(&self, chat_id: i64) -> Result<Vec<ChatNote>> {
        if let Some(notes) = self.cache.get(&chat_id) {
            return Ok(notes);
        }

        let cursor = self.collection.find(doc! { "chat_id": chat_id }).await?;
        let notes: Vec<ChatNote> = cursor.try_collect().await?;
        self.cache.insert(chat_id, notes.clone());
        Ok(notes)
    }

    pub async fn get(&self, chat_id: i64, name: &str) -> Result<Option<ChatNote>> {
        let name = name.to_lowercase();
        Ok(self
            .list(chat_id)
            .await?
            .into_iter()
            .find(|n| n.name == name))
    }

    pub async fn save(&self, note: &ChatNote) -> Result<()> {
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(doc! { "chat_id": note.chat_id, "name": &note.name }, note)
            .with_options(options)
            .await?;

        self.cache.invalidate(&note.chat_id);
        Ok(())
    }

    pub async fn remove(&self, chat_id: i64, name: &str) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "chat_id": chat_id, "name": name.to_lowercase() })
            .await?;
        self.cache.invalidate(&chat_id);
        Ok(result.deleted_count > 0)
    }
}

impl Clone for NoteRepo {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            cache: self.cache.clone(),
        }
    }
}
