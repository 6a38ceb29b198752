//! Permission checker with caching.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMember, ChatMemberKind, UserId};
use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};

/// Cached admin information.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminInfo {
    pub can_change_info: bool,
}

impl AdminInfo {
    /// Create AdminInfo from a ChatMember. `None` for regular members.
    fn from_chat_member(member: &ChatMember) -> Option<Self> {
        match &member.kind {
            ChatMemberKind::Owner(_) => Some(Self::full()),
            ChatMemberKind::Administrator(admin) => Some(Self {
                can_change_info: admin.can_change_info,
            }),
            _ => None,
        }
    }

    fn full() -> Self {
        Self {
            can_change_info: true,
        }
    }
}

/// Cache key for admin lookups.
type AdminCacheKey = (i64, u64); // (chat_id, user_id)

/// Permission checker with caching support.
///
/// Bot owners (from OWNER_IDS env) automatically bypass all permission checks.
#[derive(Clone)]
pub struct Permissions {
    bot: Bot,
    cache: TypedCache<AdminCacheKey, Option<AdminInfo>>,
    owner_ids: Arc<[u64]>,
}

impl Permissions {
    pub fn new(bot: Bot, owner_ids: &[u64]) -> Self {
        Self {
            bot,
            cache: TypedCache::new("admin_permissions", CacheConfig::admin_lookups()),
            owner_ids: owner_ids.into(),
        }
    }

    #[inline]
    pub fn is_bot_owner(&self, user_id: UserId) -> bool {
        self.owner_ids.contains(&user_id.0)
    }

    /// Get admin info for a user in a chat.
    ///
    /// Returns `None` if the user is not an admin.
    pub async fn get_admin_info(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> anyhow::Result<Option<AdminInfo>> {
        if self.is_bot_owner(user_id) {
            debug!("User {} is bot owner, granting all permissions", user_id);
            return Ok(Some(AdminInfo::full()));
        }

        let cache_key = (chat_id.0, user_id.0);

        if let Some(cached) = self.cache.get(&cache_key) {
            debug!("Admin cache hit for user {} in chat {}", user_id, chat_id);
            return Ok(cached);
        }

        debug!("Admin cache miss for user {} in chat {}", user_id, chat_id);

        let member = self.bot.get_chat_member(chat_id, user_id).await?;
        let result = AdminInfo::from_chat_member(&member);

        // Non-admins are cached too
        self.cache.insert(cache_key, result.clone());

        Ok(result)
    }

    /// Check if a user is an admin (including the chat creator).
    pub async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<bool> {
        if self.is_bot_owner(user_id) {
            return Ok(true);
        }
        Ok(self.get_admin_info(chat_id, user_id).await?.is_some())
    }

    /// Check if a user can change group info.
    pub async fn can_change_info(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<bool> {
        if self.is_bot_owner(user_id) {
            return Ok(true);
        }
        Ok(self
            .get_admin_info(chat_id, user_id)
            .await?
            .is_some_and(|a| a.can_change_info))
    }
}
