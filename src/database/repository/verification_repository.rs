//! Join verification repository.
//!
//! Records are keyed by (chat, user). A re-join overwrites the previous record.

use anyhow::Result;
use mongodb::Collection;
use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;
use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};
use crate::database::Database;
use crate::database::models::VerificationRecord;

type VerificationKey = (i64, u64); // (chat_id, user_id)

pub struct VerificationRepository {
    collection: Collection<VerificationRecord>,
    cache: TypedCache<VerificationKey, Option<VerificationRecord>>,
}

impl VerificationRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("verifications"),
            cache: TypedCache::new("verifications", CacheConfig::verifications()),
        }
    }

    pub async fn get(&self, chat_id: i64, user_id: u64) -> Result<Option<VerificationRecord>> {
        let key = (chat_id, user_id);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let filter = doc! { "chat_id": chat_id, "user_id": user_id as i64 };
        let record = self.collection.find_one(filter).await?;

        // Absence is cached too
        self.cache.insert(key, record.clone());
        Ok(record)
    }

    /// Save a record (upsert on chat and user).
    pub async fn save(&self, record: &VerificationRecord) -> Result<()> {
        let filter = doc! { "chat_id": record.chat_id, "user_id": record.user_id as i64 };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(filter, record)
            .with_options(options)
            .await?;

        self.cache
            .insert((record.chat_id, record.user_id), Some(record.clone()));
        debug!(
            "Saved {:?} verification for user {} in chat {}",
            record.state, record.user_id, record.chat_id
        );

        Ok(())
    }

    /// Delete a record. Returns whether one existed.
    pub async fn delete(&self, chat_id: i64, user_id: u64) -> Result<bool> {
        let filter = doc! { "chat_id": chat_id, "user_id": user_id as i64 };
        let result = self.collection.delete_one(filter).await?;

        self.cache.insert((chat_id, user_id), None);
        debug!("Cleared verification for user {} in chat {}", user_id, chat_id);

        Ok(result.deleted_count > 0)
    }

    /// Move every record of a chat to its new id.
    pub async fn migrate(&self, old_chat_id: i64, new_chat_id: i64) -> Result<()> {
        let result = self
            .collection
            .update_many(
                doc! { "chat_id": old_chat_id },
                doc! { "$set": { "chat_id": new_chat_id } },
            )
            .await?;

        // Keys are per user, so the whole cache goes
        self.cache.invalidate_all();
        debug!(
            "Migrated {} verification(s) from chat {} to {}",
            result.modified_count, old_chat_id, new_chat_id
        );

        Ok(())
    }
}
