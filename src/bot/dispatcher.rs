//! Message dispatcher setup.
//!
//! Builds the dispatcher with the greeting commands, the member service
//! message handlers and the verification callback.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::{DefaultKey, UpdateHandler};
use teloxide::prelude::*;

use crate::database::GreetingStore;
use crate::events;
use crate::greetings::{BotIdentity, Greeter};
use crate::permissions::Permissions;
use crate::platform::TelegramPlatform;
use crate::plugins;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Greeting preferences, chat settings and verification records.
    pub store: Arc<dyn GreetingStore>,

    /// Member event orchestration.
    pub greeter: Arc<Greeter>,

    /// Permission checker with admin caching.
    pub permissions: Permissions,
}

impl AppState {
    pub fn new(bot: ThrottledBot, store: Arc<dyn GreetingStore>, identity: BotIdentity) -> Self {
        // Permissions needs the inner Bot for API calls
        let permissions = Permissions::new(bot.inner().clone(), &identity.owner_ids);
        let platform = Arc::new(TelegramPlatform::new(bot, permissions.clone()));
        let greeter = Arc::new(Greeter::new(store.clone(), platform, identity));

        Self {
            store,
            greeter,
            permissions,
        }
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    store: Arc<dyn GreetingStore>,
    identity: BotIdentity,
) -> Dispatcher<ThrottledBot, anyhow::Error, DefaultKey> {
    let state = AppState::new(bot.clone(), store, identity);

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    // Commands first, then join/leave service messages
    let message_handler = Update::filter_message()
        .branch(plugins::command_handler())
        .branch(events::event_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(plugins::callback_handler())
}
