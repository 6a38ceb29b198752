//! Kaguya - Telegram greetings bot.
//!
//! Welcomes and says goodbye to group members with per-chat templates and
//! url buttons, and can gate new members until they prove they are human.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `greetings` - Templates, buttons, join gate, delivery and the greeter
//! - `platform` - Bot API abstraction and its Telegram implementation
//! - `database` - Greeting storage (MongoDB or in-memory)
//! - `cache` - Moka caches in front of MongoDB and admin lookups
//! - `permissions` - Admin checking with caching
//! - `bot` - Dispatcher and runtime (with Throttle for API rate limiting)
//! - `plugins` - Command handlers
//! - `events` - Join/leave service message handlers
//! - `utils` - HTML helpers

mod bot;
mod cache;
mod config;
mod database;
mod events;
mod greetings;
mod permissions;
mod platform;
mod plugins;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Config, StorageBackend};
use database::{Database, GreetingStore, MemoryStore, MongoStore};
use greetings::BotIdentity;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kaguya=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Kaguya bot...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    let store: Arc<dyn GreetingStore> = match config.storage {
        StorageBackend::Mongo => {
            let uri = config
                .mongodb_uri
                .as_deref()
                .context("MONGODB_URI must be set when STORAGE is mongo")?;
            info!("Connecting to MongoDB...");
            let db = Database::connect(uri, &config.mongodb_database).await?;
            Arc::new(MongoStore::new(&db))
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage, settings are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Throttle respects Telegram's rate limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    // - 20 messages per minute to the same group
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    let identity = BotIdentity {
        id: me.id,
        name: me.first_name.clone(),
        owner_ids: config.owner_ids.clone(),
        protected_ids: config.protected_ids.clone(),
    };

    let dispatcher = bot::build_dispatcher(bot.clone(), store, identity);

    bot::run(&config, bot, dispatcher).await
}
