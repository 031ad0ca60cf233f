//! Federation repository.

use std::time::Duration;

use anyhow::Result;
use mongodb::bson::doc;
use mongodb::Collection;
use tracing::debug;

use super::super::models::FederationRecord;
use super::super::Database;
use crate::cache::{CachePolicy, CacheRegistry, TypedCache};

pub struct FederationRepo {
    collection: Collection<FederationRecord>,
    cache: TypedCache<String, FederationRecord>,
}

impl FederationRepo {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        let fed_cache = cache.get_or_create(
            "federations",
            CachePolicy::with_capacity(1_000).ttl(Duration::from_secs(120)),
        );

        Self {
            collection: db.collection("federations"),
            cache: fed_cache,
        }
    }

    pub async fn get(&self, fed_id: &str) -> Result<Option<FederationRecord>> {
        if let Some(fed) = self.cache.get(&fed_id.to_string()) {
            return Ok(Some(fed));
        }

        let result = self.collection.find_one(doc! { "fed_id": fed_id }).await?;
        if let Some(fed) = &result {
            self.cache.insert(fed.fed_id.clone(), fed.clone());
        }
        Ok(result)
    }

    pub async fn create(&self, fed: &FederationRecord) -> Result<()> {
        self.collection.insert_one(fed).await?;
        self.cache.insert(fed.fed_id.clone(), fed.clone());
        debug!(fed_id = %fed.fed_id, name = %fed.name, "federation created");
        Ok(())
    }

    pub async fn save(&self, fed: &FederationRecord) -> Result<()> {
        self.collection
            .replace_one(doc! { "fed_id": &fed.fed_id }, fed)
            .await?;
        self.cache.insert(fed.fed_id.clone(), fed.clone());
        Ok(())
    }

    /// Federations owned by a user (owners may hold at most one).
    pub async fn owned_by(&self, owner_id: u64) -> Result<Option<FederationRecord>> {
        Ok(self
            .collection
            .find_one(doc! { "owner_id": owner_id as i64 })
            .await?)
    }

    pub async fn delete(&self, fed_id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "fed_id": fed_id }).await?;
        self.cache.invalidate(&fed_id.to_string());
        Ok(result.deleted_count > 0)
    }
}

impl Clone for FederationRepo {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            cache: self.cache.clone(),
        }
    }
}
