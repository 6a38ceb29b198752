//! Welcome/goodbye preference repository.
//!
//! One instance per greeting, each bound to its own collection.

use anyhow::Result;
use mongodb::Collection;
use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;
use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};
use crate::database::Database;
use crate::database::models::{Greeting, GreetingPreference};

pub struct PreferenceRepository {
    greeting: Greeting,
    collection: Collection<GreetingPreference>,
    cache: TypedCache<i64, GreetingPreference>,
}

impl PreferenceRepository {
    pub fn new(db: &Database, greeting: Greeting) -> Self {
        Self {
            greeting,
            collection: db.collection(greeting.collection_name()),
            cache: TypedCache::new(
                format!("{greeting}_preferences"),
                CacheConfig::greeting_settings(),
            ),
        }
    }

    /// Get the preference, falling back to the defaults when the chat has none.
    ///
    /// Defaults are not written back; the first `save` creates the document.
    pub async fn get(&self, chat_id: i64) -> Result<GreetingPreference> {
        if let Some(preference) = self.cache.get(&chat_id) {
            return Ok(preference);
        }

        let filter = doc! { "chat_id": chat_id };
        let preference = self
            .collection
            .find_one(filter)
            .await?
            .unwrap_or_else(|| GreetingPreference::new(self.greeting, chat_id));

        self.cache.insert(chat_id, preference.clone());
        Ok(preference)
    }

    /// Save the preference (upsert).
    pub async fn save(&self, preference: &GreetingPreference) -> Result<()> {
        let filter = doc! { "chat_id": preference.chat_id };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(filter, preference)
            .with_options(options)
            .await?;

        self.cache.insert(preference.chat_id, preference.clone());
        debug!(
            "Saved {} preference for chat {}",
            self.greeting, preference.chat_id
        );

        Ok(())
    }

    /// Move the chat's preference to its new id.
    pub async fn migrate(&self, old_chat_id: i64, new_chat_id: i64) -> Result<()> {
        let result = self
            .collection
            .update_many(
                doc! { "chat_id": old_chat_id },
                doc! { "$set": { "chat_id": new_chat_id } },
            )
            .await?;

        self.cache.invalidate(&old_chat_id);
        self.cache.invalidate(&new_chat_id);
        debug!(
            "Migrated {} {} preference(s) from chat {} to {}",
            result.modified_count, self.greeting, old_chat_id, new_chat_id
        );

        Ok(())
    }
}
