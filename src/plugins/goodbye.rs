//! Goodbye command handlers.

use teloxide::prelude::*;

use super::welcome::{reset_greeting, set_greeting, show_or_toggle};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::Greeting;

pub async fn goodbye_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    show_or_toggle(Greeting::Goodbye, &bot, &msg, &state, &args).await
}

pub async fn setgoodbye_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    set_greeting(Greeting::Goodbye, &bot, &msg, &state, &args).await
}

pub async fn resetgoodbye_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    reset_greeting(Greeting::Goodbye, &bot, &msg, &state).await
}
