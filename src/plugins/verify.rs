//! Join verification button callback.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::bot::dispatcher::AppState;
use crate::greetings::VerifyPress;
use crate::greetings::join_gate::VERIFY_PREFIX;

/// Handles presses on the "I'm a human" button of the strong join gate.
pub fn handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|q: CallbackQuery| {
        q.data
            .as_deref()
            .is_some_and(|d| d.starts_with(VERIFY_PREFIX))
    })
    .endpoint(verify_callback)
}

async fn verify_callback(q: CallbackQuery, state: AppState) -> anyhow::Result<()> {
    let (Some(message), Some(payload)) = (q.message.as_ref(), q.data.clone()) else {
        return Ok(());
    };

    let press = VerifyPress {
        chat_id: message.chat().id,
        callback_id: q.id.to_string(),
        presser: q.from.id,
        payload,
        prompt_message: Some(message.id()),
    };

    state.greeter.verify_pressed(&press).await?;
    Ok(())
}
