//! In-process store, used with `STORAGE=memory` and in tests.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::models::{ChatGreetingSettings, Greeting, GreetingPreference, VerificationRecord};
use super::store::GreetingStore;

/// Volatile [`GreetingStore`] backed by concurrent maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    preferences: DashMap<(Greeting, i64), GreetingPreference>,
    settings: DashMap<i64, ChatGreetingSettings>,
    verifications: DashMap<(i64, u64), VerificationRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GreetingStore for MemoryStore {
    async fn preference(
        &self,
        greeting: Greeting,
        chat_id: i64,
    ) -> anyhow::Result<GreetingPreference> {
        Ok(self
            .preferences
            .get(&(greeting, chat_id))
            .map(|p| p.clone())
            .unwrap_or_else(|| GreetingPreference::new(greeting, chat_id)))
    }

    async fn set_preference(
        &self,
        greeting: Greeting,
        preference: &GreetingPreference,
    ) -> anyhow::Result<()> {
        self.preferences
            .insert((greeting, preference.chat_id), preference.clone());
        debug!("Saved {} preference for chat {}", greeting, preference.chat_id);
        Ok(())
    }

    async fn chat_settings(&self, chat_id: i64) -> anyhow::Result<ChatGreetingSettings> {
        Ok(self
            .settings
            .get(&chat_id)
            .map(|s| s.clone())
            .unwrap_or_else(|| ChatGreetingSettings::new(chat_id)))
    }

    async fn set_chat_settings(&self, settings: &ChatGreetingSettings) -> anyhow::Result<()> {
        self.settings.insert(settings.chat_id, settings.clone());
        Ok(())
    }

    async fn verification(
        &self,
        chat_id: i64,
        user_id: u64,
    ) -> anyhow::Result<Option<VerificationRecord>> {
        Ok(self
            .verifications
            .get(&(chat_id, user_id))
            .map(|r| r.clone()))
    }

    async fn set_verification(&self, record: &VerificationRecord) -> anyhow::Result<()> {
        self.verifications
            .insert((record.chat_id, record.user_id), record.clone());
        Ok(())
    }

    async fn clear_verification(&self, chat_id: i64, user_id: u64) -> anyhow::Result<bool> {
        Ok(self.verifications.remove(&(chat_id, user_id)).is_some())
    }

    async fn migrate_chat(&self, old_chat_id: i64, new_chat_id: i64) -> anyhow::Result<()> {
        for greeting in [Greeting::Welcome, Greeting::Goodbye] {
            if let Some((_, mut preference)) = self.preferences.remove(&(greeting, old_chat_id)) {
                preference.chat_id = new_chat_id;
                self.preferences.insert((greeting, new_chat_id), preference);
            }
        }

        if let Some((_, mut settings)) = self.settings.remove(&old_chat_id) {
            settings.chat_id = new_chat_id;
            settings.last_welcome_id = None;
            self.settings.insert(new_chat_id, settings);
        }

        let users: Vec<u64> = self
            .verifications
            .iter()
            .filter(|entry| entry.key().0 == old_chat_id)
            .map(|entry| entry.key().1)
            .collect();
        for user_id in users {
            if let Some((_, mut record)) = self.verifications.remove(&(old_chat_id, user_id)) {
                record.chat_id = new_chat_id;
                self.verifications.insert((new_chat_id, user_id), record);
            }
        }

        debug!("Migrated greeting data from chat {} to {}", old_chat_id, new_chat_id);
        Ok(())
    }
}
