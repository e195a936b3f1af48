//! MongoDB connection wrapper.

use anyhow::{Context, Result};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use tracing::info;

/// Handle on the authoritative database.
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    db: mongodb::Database,
}

impl Database {
    /// Connect to MongoDB and verify the server answers.
    ///
    /// # Errors
    /// Returns error if the URI is invalid or the ping fails.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .context("invalid MONGODB_URI")?;
        let client = Client::with_options(options)?;

        let db = Self {
            db: client.database(db_name),
            client,
        };
        db.ping().await?;

        info!("Successfully connected to MongoDB ({})", db_name);
        Ok(db)
    }

    /// Round trip to the server.
    pub async fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }

    /// Get a typed collection from the database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}
