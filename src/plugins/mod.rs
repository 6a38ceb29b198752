//! Command handlers for configuring greetings, plus the verification callback.
//!
//! Every command is group-only and restricted to admins who may change the
//! chat info. Bot owners pass every check.

pub mod goodbye;
pub mod verify;
pub mod welcome;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters, UserId};
use teloxide::utils::command::BotCommands;

use crate::bot::dispatcher::{AppState, ThrottledBot};

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Greeting commands:")]
pub enum Command {
    #[command(description = "show or toggle the welcome message (on/off/noformat)")]
    Welcome(String),

    #[command(description = "show or toggle the goodbye message (on/off/noformat)")]
    Goodbye(String),

    #[command(description = "set the welcome message, or reply to a message or media")]
    Setwelcome(String),

    #[command(description = "set the goodbye message, or reply to a message or media")]
    Setgoodbye(String),

    #[command(description = "restore the default welcome message")]
    Resetwelcome,

    #[command(description = "restore the default goodbye message")]
    Resetgoodbye,

    #[command(description = "restrict new members (off/soft/strong)")]
    Welcomemute(String),

    #[command(description = "delete the previous welcome message (on/off)")]
    Cleanwelcome(String),

    #[command(description = "delete join/leave service messages (on/off)")]
    Cleanservice(String),

    #[command(description = "placeholders and button syntax for greetings")]
    Welcomehelp,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        // Welcome
        .branch(case![Command::Welcome(args)].endpoint(welcome::welcome_command))
        .branch(case![Command::Setwelcome(args)].endpoint(welcome::setwelcome_command))
        .branch(case![Command::Resetwelcome].endpoint(welcome::resetwelcome_command))
        .branch(case![Command::Welcomemute(args)].endpoint(welcome::welcomemute_command))
        .branch(case![Command::Cleanwelcome(args)].endpoint(welcome::cleanwelcome_command))
        .branch(case![Command::Cleanservice(args)].endpoint(welcome::cleanservice_command))
        .branch(case![Command::Welcomehelp].endpoint(welcome::welcomehelp_command))
        // Goodbye
        .branch(case![Command::Goodbye(args)].endpoint(goodbye::goodbye_command))
        .branch(case![Command::Setgoodbye(args)].endpoint(goodbye::setgoodbye_command))
        .branch(case![Command::Resetgoodbye].endpoint(goodbye::resetgoodbye_command))
}

/// Build the callback query handler.
pub fn callback_handler() -> UpdateHandler<anyhow::Error> {
    Update::filter_callback_query().branch(verify::handler())
}

/// Reply to a command message with plain text.
pub(crate) async fn reply(
    bot: &ThrottledBot,
    msg: &Message,
    text: impl Into<String>,
) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Reply to a command message with HTML text.
pub(crate) async fn reply_html(
    bot: &ThrottledBot,
    msg: &Message,
    text: impl Into<String>,
) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Check that the command runs in a group and the sender may change the chat
/// info. Replies with the reason and returns `None` otherwise.
pub(crate) async fn authorized_admin(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<Option<UserId>> {
    let Some(user_id) = msg.from.as_ref().map(|u| u.id) else {
        return Ok(None);
    };

    if !msg.chat.is_group() && !msg.chat.is_supergroup() {
        reply(bot, msg, "This command is meant to be used in group chats.").await?;
        return Ok(None);
    }

    if !state
        .permissions
        .can_change_info(msg.chat.id, user_id)
        .await
        .unwrap_or(false)
    {
        reply(
            bot,
            msg,
            "You need to be an admin with the right to change group info to do this.",
        )
        .await?;
        return Ok(None);
    }

    Ok(Some(user_id))
}

/// Parse an on/off style argument.
pub(crate) fn parse_toggle(arg: &str) -> Option<bool> {
    match arg.to_lowercase().as_str() {
        "on" | "yes" => Some(true),
        "off" | "no" => Some(false),
        _ => None,
    }
}
