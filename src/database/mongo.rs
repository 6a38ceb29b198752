//! MongoDB connection and the Mongo-backed [`GreetingStore`].

use async_trait::async_trait;
use mongodb::{Client, Collection, options::ClientOptions};
use tracing::info;

use super::models::{ChatGreetingSettings, Greeting, GreetingPreference, VerificationRecord};
use super::repository::{ChatSettingsRepository, PreferenceRepository, VerificationRepository};
use super::store::GreetingStore;

/// Database wrapper for MongoDB operations.
#[derive(Debug, Clone)]
pub struct Database {
    db: mongodb::Database,
}

impl Database {
    /// Connect to MongoDB with the given URI and database name.
    ///
    /// # Errors
    /// Returns error if the URI is invalid or the server does not answer a ping.
    pub async fn connect(uri: &str, db_name: &str) -> anyhow::Result<Self> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(mongodb::bson::doc! { "ping": 1 })
            .await?;

        info!("Successfully connected to MongoDB");

        Ok(Self {
            db: client.database(db_name),
        })
    }

    /// Get a typed collection from the database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}

/// [`GreetingStore`] over the `welcome`, `goodbye`, `greeting_settings`
/// and `verifications` collections.
pub struct MongoStore {
    welcome: PreferenceRepository,
    goodbye: PreferenceRepository,
    settings: ChatSettingsRepository,
    verifications: VerificationRepository,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            welcome: PreferenceRepository::new(db, Greeting::Welcome),
            goodbye: PreferenceRepository::new(db, Greeting::Goodbye),
            settings: ChatSettingsRepository::new(db),
            verifications: VerificationRepository::new(db),
        }
    }

    fn preferences(&self, greeting: Greeting) -> &PreferenceRepository {
        match greeting {
            Greeting::Welcome => &self.welcome,
            Greeting::Goodbye => &self.goodbye,
        }
    }
}

#[async_trait]
impl GreetingStore for MongoStore {
    async fn preference(
        &self,
        greeting: Greeting,
        chat_id: i64,
    ) -> anyhow::Result<GreetingPreference> {
        self.preferences(greeting).get(chat_id).await
    }

    async fn set_preference(
        &self,
        greeting: Greeting,
        preference: &GreetingPreference,
    ) -> anyhow::Result<()> {
        self.preferences(greeting).save(preference).await
    }

    async fn chat_settings(&self, chat_id: i64) -> anyhow::Result<ChatGreetingSettings> {
        self.settings.get(chat_id).await
    }

    async fn set_chat_settings(&self, settings: &ChatGreetingSettings) -> anyhow::Result<()> {
        self.settings.save(settings).await
    }

    async fn verification(
        &self,
        chat_id: i64,
        user_id: u64,
    ) -> anyhow::Result<Option<VerificationRecord>> {
        self.verifications.get(chat_id, user_id).await
    }

    async fn set_verification(&self, record: &VerificationRecord) -> anyhow::Result<()> {
        self.verifications.save(record).await
    }

    async fn clear_verification(&self, chat_id: i64, user_id: u64) -> anyhow::Result<bool> {
        self.verifications.delete(chat_id, user_id).await
    }

    async fn migrate_chat(&self, old_chat_id: i64, new_chat_id: i64) -> anyhow::Result<()> {
        self.welcome.migrate(old_chat_id, new_chat_id).await?;
        self.goodbye.migrate(old_chat_id, new_chat_id).await?;
        self.settings.migrate(old_chat_id, new_chat_id).await?;
        self.verifications.migrate(old_chat_id, new_chat_id).await
    }
}
