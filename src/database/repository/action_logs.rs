//! Append-only action log repository.

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Collection;

use super::super::models::ActionLogEntry;
use super::super::Database;

pub struct ActionLogRepo {
    collection: Collection<ActionLogEntry>,
}

impl ActionLogRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("action_logs"),
        }
    }

    pub async fn append(&self, entry: &ActionLogEntry) -> Result<()> {
        self.collection.insert_one(entry).await?;
        Ok(())
    }

    /// Most recent entries for a chat, newest first.
    pub async fn recent(&self, chat_id: i64, limit: i64) -> Result<Vec<ActionLogEntry>> {
        let cursor = self
            .collection
            .find(doc! { "chat_id": chat_id })
            .sort(doc! { "timestamp": -1 })
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Entries targeting a user across a chat, newest first.
    pub async fn for_user(
        &self,
        chat_id: i64,
        user_id: u64,
        limit: i64,
    ) -> Result<Vec<ActionLogEntry>> {
        let cursor = self
            .collection
            .find(doc! { "chat_id": chat_id, "target_user": user_id as i64 })
            .sort(doc! { "timestamp": -1 })
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

impl Clone for ActionLogRepo {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
        }
    }
}
