//! Configuration module for the Kaguya bot.
//!
//! Loads configuration from environment variables.

use std::env;

use anyhow::{Context, bail};
use serde::Deserialize;

/// Bot running mode
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Where chat preferences and verification records live.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Mongo,
    /// Process-local storage, lost on restart. Meant for local testing.
    Memory,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Owner user IDs (comma-separated).
    /// Owners get a special greeting and are never gated on join.
    pub owner_ids: Vec<u64>,

    /// Allow-listed user IDs that are never restricted on join.
    pub protected_ids: Vec<u64>,

    // Storage
    pub storage: StorageBackend,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bot_token = lookup("BOT_TOKEN")
            .filter(|s| !s.trim().is_empty())
            .context("BOT_TOKEN must be set")?;

        let bot_mode = match lookup("BOT_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = lookup("WEBHOOK_URL").filter(|s| !s.is_empty());
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            bail!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        let webhook_port = match lookup("WEBHOOK_PORT") {
            Some(port) => port
                .trim()
                .parse()
                .with_context(|| format!("Invalid WEBHOOK_PORT: {port}"))?,
            None => 8443,
        };

        let storage = match lookup("STORAGE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            _ => StorageBackend::Mongo,
        };

        let mongodb_uri = lookup("MONGODB_URI").filter(|s| !s.is_empty());
        if storage == StorageBackend::Mongo && mongodb_uri.is_none() {
            bail!("MONGODB_URI must be set when STORAGE is mongo");
        }

        Ok(Self {
            bot_token,
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret: lookup("WEBHOOK_SECRET").filter(|s| !s.is_empty()),
            owner_ids: parse_id_list(lookup("OWNER_IDS").as_deref()),
            protected_ids: parse_id_list(lookup("PROTECTED_IDS").as_deref()),
            storage,
            mongodb_uri,
            mongodb_database: lookup("MONGODB_DATABASE")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "kaguya".to_string()),
        })
    }
}

/// Parse a comma-separated id list, skipping anything that isn't a number.
fn parse_id_list(raw: Option<&str>) -> Vec<u64> {
    raw.unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_memory_config() {
        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "123:abc"), ("STORAGE", "memory")]))
            .unwrap();

        assert_eq!(config.bot_mode, BotMode::Polling);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.webhook_port, 8443);
        assert_eq!(config.mongodb_database, "kaguya");
        assert!(config.owner_ids.is_empty());
    }

    #[test]
    fn test_id_lists_skip_garbage() {
        let config = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "123:abc"),
            ("MONGODB_URI", "mongodb://localhost"),
            ("OWNER_IDS", "1, 2,x,,3"),
            ("PROTECTED_IDS", "42"),
        ]))
        .unwrap();

        assert_eq!(config.owner_ids, vec![1, 2, 3]);
        assert_eq!(config.protected_ids, vec![42]);
        assert_eq!(config.storage, StorageBackend::Mongo);
    }

    #[test]
    fn test_missing_requirements_are_errors() {
        assert!(Config::from_lookup(lookup(&[("STORAGE", "memory")])).is_err());
        assert!(Config::from_lookup(lookup(&[("BOT_TOKEN", "t")])).is_err());
        assert!(
            Config::from_lookup(lookup(&[
                ("BOT_TOKEN", "t"),
                ("STORAGE", "memory"),
                ("BOT_MODE", "webhook"),
            ]))
            .is_err()
        );
        assert!(
            Config::from_lookup(lookup(&[
                ("BOT_TOKEN", "t"),
                ("STORAGE", "memory"),
                ("WEBHOOK_PORT", "not-a-port"),
            ]))
            .is_err()
        );
    }
}
