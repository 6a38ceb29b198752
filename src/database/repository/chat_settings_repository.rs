//! Greeting housekeeping settings repository.

use anyhow::Result;
use mongodb::Collection;
use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;
use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};
use crate::database::Database;
use crate::database::models::ChatGreetingSettings;

pub struct ChatSettingsRepository {
    collection: Collection<ChatGreetingSettings>,
    cache: TypedCache<i64, ChatGreetingSettings>,
}

impl ChatSettingsRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("greeting_settings"),
            cache: TypedCache::new("greeting_settings", CacheConfig::greeting_settings()),
        }
    }

    /// Get settings, returning defaults if the chat never changed them.
    pub async fn get(&self, chat_id: i64) -> Result<ChatGreetingSettings> {
        if let Some(settings) = self.cache.get(&chat_id) {
            return Ok(settings);
        }

        let filter = doc! { "chat_id": chat_id };
        let settings = self
            .collection
            .find_one(filter)
            .await?
            .unwrap_or_else(|| ChatGreetingSettings::new(chat_id));

        self.cache.insert(chat_id, settings.clone());
        Ok(settings)
    }

    /// Save settings (upsert).
    pub async fn save(&self, settings: &ChatGreetingSettings) -> Result<()> {
        let filter = doc! { "chat_id": settings.chat_id };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(filter, settings)
            .with_options(options)
            .await?;

        self.cache.insert(settings.chat_id, settings.clone());
        debug!("Saved greeting settings for chat {}", settings.chat_id);

        Ok(())
    }

    /// Move the chat's settings to its new id. The stored welcome id belonged
    /// to the old chat and is dropped.
    pub async fn migrate(&self, old_chat_id: i64, new_chat_id: i64) -> Result<()> {
        let result = self
            .collection
            .update_many(
                doc! { "chat_id": old_chat_id },
                doc! {
                    "$set": { "chat_id": new_chat_id },
                    "$unset": { "last_welcome_id": "" },
                },
            )
            .await?;

        self.cache.invalidate(&old_chat_id);
        self.cache.invalidate(&new_chat_id);
        debug!(
            "Migrated {} greeting settings from chat {} to {}",
            result.modified_count, old_chat_id, new_chat_id
        );

        Ok(())
    }
}
