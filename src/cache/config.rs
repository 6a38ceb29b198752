//! Cache configuration.

use std::time::Duration;

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Time-to-live for cache entries.
    pub ttl: Option<Duration>,

    /// Time-to-idle for cache entries.
    pub tti: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(300)), // 5 minutes
            tti: None,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with the given max capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            max_capacity,
            ..Default::default()
        }
    }

    /// Set time-to-live for cache entries.
    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.ttl = Some(duration);
        self
    }

    /// Set time-to-idle for cache entries.
    #[must_use]
    pub fn tti(mut self, duration: Duration) -> Self {
        self.tti = Some(duration);
        self
    }

    /// Welcome/goodbye preferences and chat settings.
    /// Read on every join, written only by admin commands.
    pub fn greeting_settings() -> Self {
        Self::with_capacity(5_000).ttl(Duration::from_secs(600))
    }

    /// Verification records. Short lived, touched on join and on button press.
    pub fn verifications() -> Self {
        Self::with_capacity(20_000)
            .ttl(Duration::from_secs(1800))
            .tti(Duration::from_secs(300))
    }

    /// Admin status per (chat, user).
    pub fn admin_lookups() -> Self {
        Self::with_capacity(10_000)
            .ttl(Duration::from_secs(300))
            .tti(Duration::from_secs(120))
    }
}
