//! Goodbye event handler.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::debug;

use crate::bot::dispatcher::AppState;
use crate::greetings::{LeaveEvent, Member};

/// Returns the handler for "left chat member" service messages.
pub fn handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter_map(leave_event).endpoint(goodbye_handler)
}

fn leave_event(msg: Message) -> Option<LeaveEvent> {
    let member = Member::from(msg.left_chat_member()?);

    Some(LeaveEvent {
        chat_id: msg.chat.id,
        chat_title: msg.chat.title().unwrap_or_default().to_string(),
        service_message: msg.id,
        member,
    })
}

async fn goodbye_handler(event: LeaveEvent, state: AppState) -> anyhow::Result<()> {
    debug!("Member {} left chat {}", event.member.id, event.chat_id);
    state.greeter.member_left(&event).await
}
