//! Welcome event handler.
//!
//! Handles new member service messages: welcome, join gate, cleanup.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::debug;

use crate::bot::dispatcher::AppState;
use crate::greetings::{JoinEvent, Member};

/// Returns the handler for new member service messages.
pub fn handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter_map(join_event).endpoint(welcome_handler)
}

/// Build a [`JoinEvent`] from a "new chat members" service message.
fn join_event(msg: Message) -> Option<JoinEvent> {
    let members: Vec<Member> = msg.new_chat_members()?.iter().map(Member::from).collect();
    if members.is_empty() {
        return None;
    }

    // The service message sender is whoever added the members
    let added_by = msg
        .from
        .as_ref()
        .map(Member::from)
        .unwrap_or_else(|| members[0].clone());

    Some(JoinEvent {
        chat_id: msg.chat.id,
        chat_title: msg.chat.title().unwrap_or_default().to_string(),
        service_message: msg.id,
        added_by,
        members,
        joined_at: msg.date,
    })
}

async fn welcome_handler(event: JoinEvent, state: AppState) -> anyhow::Result<()> {
    debug!(
        "{} new member(s) in chat {}",
        event.members.len(),
        event.chat_id
    );
    state.greeter.member_joined(&event).await
}
