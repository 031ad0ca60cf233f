//! MongoDB connection and index bootstrap.

use mongodb::bson::doc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use tracing::info;

/// Shared handle to the MongoDB database.
#[derive(Debug, Clone)]
pub struct Database {
    db: mongodb::Database,
}

impl Database {
    /// Connect, ping, and create the indexes every collection relies on.
    pub async fn connect(uri: &str, db_name: &str) -> anyhow::Result<Self> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;

        // Fail fast on a bad URI instead of at the first query.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        info!(db = db_name, "connected to MongoDB");

        let db = client.database(db_name);
        let database = Self { db };
        database.ensure_indexes().await?;
        Ok(database)
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    async fn ensure_indexes(&self) -> anyhow::Result<()> {
        let unique = IndexOptions::builder().unique(true).build();

        self.db
            .collection::<mongodb::bson::Document>("chats")
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "chat_id": 1 })
                    .options(unique.clone())
                    .build(),
                IndexModel::builder().keys(doc! { "fed_id": 1 }).build(),
            ])
            .await?;

        self.db
            .collection::<mongodb::bson::Document>("users")
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "user_id": 1 })
                    .options(unique.clone())
                    .build(),
                IndexModel::builder().keys(doc! { "username": 1 }).build(),
            ])
            .await?;

        self.db
            .collection::<mongodb::bson::Document>("federations")
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "fed_id": 1 })
                    .options(unique.clone())
                    .build(),
                IndexModel::builder().keys(doc! { "owner_id": 1 }).build(),
            ])
            .await?;

        self.db
            .collection::<mongodb::bson::Document>("filters")
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "chat_id": 1, "trigger": 1 })
                    .options(unique.clone())
                    .build(),
            ])
            .await?;

        self.db
            .collection::<mongodb::bson::Document>("notes")
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "chat_id": 1, "name": 1 })
                    .options(unique)
                    .build(),
            ])
            .await?;

        self.db
            .collection::<mongodb::bson::Document>("captcha_pending")
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "chat_id": 1, "user_id": 1 })
                    .build(),
                IndexModel::builder().keys(doc! { "expires_at": 1 }).build(),
            ])
            .await?;

        self.db
            .collection::<mongodb::bson::Document>("action_logs")
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "chat_id": 1, "timestamp": -1 })
                    .build(),
                IndexModel::builder().keys(doc! { "target_user": 1 }).build(),
            ])
            .await?;

        info!("database indexes ensured");
        Ok(())
    }
}
