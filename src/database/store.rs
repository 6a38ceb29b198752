//! Storage seam used by the greeting core and the admin commands.

use async_trait::async_trait;

use super::models::{ChatGreetingSettings, Greeting, GreetingPreference, VerificationRecord};
use crate::greetings::JoinGatePolicy;

/// Persistence for greeting preferences, chat settings and verification records.
///
/// Reads return defaults for chats that never configured anything.
#[async_trait]
pub trait GreetingStore: Send + Sync {
    async fn preference(&self, greeting: Greeting, chat_id: i64)
    -> anyhow::Result<GreetingPreference>;

    async fn set_preference(
        &self,
        greeting: Greeting,
        preference: &GreetingPreference,
    ) -> anyhow::Result<()>;

    async fn chat_settings(&self, chat_id: i64) -> anyhow::Result<ChatGreetingSettings>;

    async fn set_chat_settings(&self, settings: &ChatGreetingSettings) -> anyhow::Result<()>;

    async fn verification(
        &self,
        chat_id: i64,
        user_id: u64,
    ) -> anyhow::Result<Option<VerificationRecord>>;

    async fn set_verification(&self, record: &VerificationRecord) -> anyhow::Result<()>;

    /// Remove a record. Returns whether one existed.
    async fn clear_verification(&self, chat_id: i64, user_id: u64) -> anyhow::Result<bool>;

    /// Re-key everything stored for a chat after Telegram gave it a new id.
    async fn migrate_chat(&self, old_chat_id: i64, new_chat_id: i64) -> anyhow::Result<()>;

    async fn join_gate(&self, chat_id: i64) -> anyhow::Result<JoinGatePolicy> {
        Ok(self.chat_settings(chat_id).await?.join_gate)
    }

    async fn set_join_gate(&self, chat_id: i64, policy: JoinGatePolicy) -> anyhow::Result<()> {
        let mut settings = self.chat_settings(chat_id).await?;
        settings.join_gate = policy;
        self.set_chat_settings(&settings).await
    }

    async fn clean_service(&self, chat_id: i64) -> anyhow::Result<bool> {
        Ok(self.chat_settings(chat_id).await?.clean_service)
    }

    async fn set_clean_service(&self, chat_id: i64, enabled: bool) -> anyhow::Result<()> {
        let mut settings = self.chat_settings(chat_id).await?;
        settings.clean_service = enabled;
        self.set_chat_settings(&settings).await
    }

    async fn set_clean_welcome(&self, chat_id: i64, enabled: bool) -> anyhow::Result<()> {
        let mut settings = self.chat_settings(chat_id).await?;
        settings.clean_welcome = enabled;
        self.set_chat_settings(&settings).await
    }

    async fn set_greeting_enabled(
        &self,
        greeting: Greeting,
        chat_id: i64,
        enabled: bool,
    ) -> anyhow::Result<()> {
        let mut preference = self.preference(greeting, chat_id).await?;
        preference.enabled = enabled;
        self.set_preference(greeting, &preference).await
    }
}
