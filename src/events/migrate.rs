//! Chat migration handler.
//!
//! When a group becomes a supergroup Telegram gives it a new chat id and
//! posts a "migrated to" service message in the old chat.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::info;

use crate::bot::dispatcher::AppState;

/// Old and new id of an upgraded chat.
#[derive(Debug, Clone, Copy)]
pub struct ChatMigration {
    pub from: ChatId,
    pub to: ChatId,
}

/// Returns the handler for "migrated to supergroup" service messages.
pub fn handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter_map(chat_migration).endpoint(migrate_handler)
}

fn chat_migration(msg: Message) -> Option<ChatMigration> {
    let to = *msg.migrate_to_chat_id()?;
    Some(ChatMigration {
        from: msg.chat.id,
        to,
    })
}

async fn migrate_handler(migration: ChatMigration, state: AppState) -> anyhow::Result<()> {
    state
        .store
        .migrate_chat(migration.from.0, migration.to.0)
        .await?;
    info!(
        "Moved greeting settings from chat {} to {}",
        migration.from, migration.to
    );
    Ok(())
}
