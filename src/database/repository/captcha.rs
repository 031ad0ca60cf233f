//! Pending captcha repository.

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Collection;

use super::super::models::PendingCaptcha;
use super::super::Database;

pub struct CaptchaRepo {
    collection: Collection<PendingCaptcha>,
}

impl CaptchaRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("captcha_pending"),
        }
    }

    /// Register a pending member, replacing any previous entry for the
    /// same (chat, user) pair.
    pub async fn add(&self, pending: &PendingCaptcha) -> Result<()> {
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(
                doc! { "chat_id": pending.chat_id, "user_id": pending.user_id as i64 },
                pending,
            )
            .with_options(options)
            .await?;
        Ok(())
    }

    pub async fn get(&self, chat_id: i64, user_id: u64) -> Result<Option<PendingCaptcha>> {
        Ok(self
            .collection
            .find_one(doc! { "chat_id": chat_id, "user_id": user_id as i64 })
            .await?)
    }

    /// Drop the entry after a pass, a kick, or an admin override.
    pub async fn remove(&self, chat_id: i64, user_id: u64) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "chat_id": chat_id, "user_id": user_id as i64 })
            .await?;
        Ok(result.deleted_count > 0)
    }

    /// Entries whose deadline has passed, for the sweeper.
    pub async fn expired(&self, now: i64) -> Result<Vec<PendingCaptcha>> {
        let cursor = self
            .collection
            .find(doc! { "expires_at": { "$lte": now } })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

impl Clone for CaptchaRepo {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
        }
    }
}
