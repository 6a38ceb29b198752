//! Event handlers for member service messages.
//!
//! Telegram posts a service message when members join or leave a group.
//! These handlers turn those messages into greeter events. Chat upgrades
//! move the stored greeting data to the new chat id.

pub mod goodbye;
pub mod migrate;
pub mod welcome;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

/// Build the combined handler for join, leave and migration service messages.
pub fn event_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|msg: Message| msg.chat.is_group() || msg.chat.is_supergroup())
        .branch(welcome::handler())
        .branch(goodbye::handler())
        .branch(migrate::handler())
}
