//! Welcome command handlers.
//!
//! The show/toggle, set and reset flows are shared with `/goodbye` and
//! friends through the `Greeting`-parameterized helpers below.

use teloxide::prelude::*;
use teloxide::types::UserId;
use tracing::info;

use super::{authorized_admin, parse_toggle, reply, reply_html};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::Greeting;
use crate::greetings::JoinGatePolicy;
use crate::greetings::buttons;
use crate::platform::MediaKind;

const NOTHING_TO_SET: &str = "You didn't specify what to reply with!";
const TOGGLE_USAGE: &str = "I understand 'on/yes' or 'off/no' only!";

const WELCOME_HELP: &str = "Your group's welcome/goodbye messages can be personalised in multiple ways. \
You can use <b>these</b> variables:\n\
 - <code>{first}</code>: the user's <b>first</b> name\n\
 - <code>{last}</code>: the user's <b>last</b> name. Defaults to the first name if the user has no last name.\n\
 - <code>{fullname}</code>: the user's <b>full</b> name. Defaults to the first name if the user has no last name.\n\
 - <code>{username}</code>: the user's <b>username</b>. Defaults to a mention of the user if they have no username.\n\
 - <code>{mention}</code>: <b>mentions</b> the user, tagging them with their first name.\n\
 - <code>{id}</code>: the user's <b>id</b>\n\
 - <code>{count}</code>: the user's <b>member number</b>.\n\
 - <code>{chatname}</code>: the <b>current chat name</b>.\n\n\
Each variable MUST be surrounded by <code>{}</code> to be replaced. \
Write <code>{{first}}</code> to show <code>{first}</code> as-is.\n\
Welcome messages support HTML, so you can make any element bold, italic, code or a link.\n\n\
Buttons are supported too: <code>[Rules](buttonurl://t.me/yourchat)</code> creates a button linking \
to your chat. End the url with <code>:same</code> to put the button on the same row as the previous one. \
Put buttons at the end of the message.\n\n\
You can also set a sticker, photo, document, audio, voice message or video as the greeting by replying \
to it with /setwelcome.";

/// Content for `/setwelcome` and `/setgoodbye`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GreetingContent {
    Text(String),
    Media(MediaKind, String),
}

/// Media from a replied message wins, then the command arguments, then the
/// replied message's text or caption.
fn extract_content(msg: &Message, args: &str) -> Option<GreetingContent> {
    let replied = msg.reply_to_message();

    if let Some((kind, file_id)) = replied.and_then(media_of) {
        return Some(GreetingContent::Media(kind, file_id));
    }

    let args = args.trim();
    if !args.is_empty() {
        return Some(GreetingContent::Text(args.to_string()));
    }

    replied
        .and_then(|r| r.text().or_else(|| r.caption()))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| GreetingContent::Text(t.to_string()))
}

fn media_of(msg: &Message) -> Option<(MediaKind, String)> {
    if let Some(sticker) = msg.sticker() {
        Some((MediaKind::Sticker, sticker.file.id.to_string()))
    } else if let Some(document) = msg.document() {
        Some((MediaKind::Document, document.file.id.to_string()))
    } else if let Some(photo) = msg.photo() {
        // Largest size
        photo
            .iter()
            .max_by_key(|p| p.width * p.height)
            .map(|p| (MediaKind::Photo, p.file.id.to_string()))
    } else if let Some(audio) = msg.audio() {
        Some((MediaKind::Audio, audio.file.id.to_string()))
    } else if let Some(voice) = msg.voice() {
        Some((MediaKind::Voice, voice.file.id.to_string()))
    } else {
        msg.video()
            .map(|video| (MediaKind::Video, video.file.id.to_string()))
    }
}

/// `/welcome` and `/goodbye`: show the setting and a preview, or toggle.
pub(crate) async fn show_or_toggle(
    greeting: Greeting,
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    args: &str,
) -> anyhow::Result<()> {
    let Some(user_id) = authorized_admin(bot, msg, state).await? else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    let arg = args.split_whitespace().next().unwrap_or("").to_lowercase();
    if arg.is_empty() || arg == "noformat" {
        let preference = state.store.preference(greeting, chat_id.0).await?;
        reply_html(
            bot,
            msg,
            format!(
                "This chat has its {} setting set to: <code>{}</code>.\n\
                 <b>The {} message (not filling the {{}}) is:</b>",
                greeting, preference.enabled, greeting
            ),
        )
        .await?;
        return state
            .greeter
            .preview(greeting, chat_id, None, arg == "noformat")
            .await;
    }

    let Some(enabled) = parse_toggle(&arg) else {
        return reply(bot, msg, TOGGLE_USAGE).await;
    };

    state
        .store
        .set_greeting_enabled(greeting, chat_id.0, enabled)
        .await?;
    log_action(user_id, chat_id, &format!("turned {} {}", greeting, on_off(enabled)));

    let answer = match (greeting, enabled) {
        (Greeting::Welcome, true) => "I'll be polite!",
        (Greeting::Welcome, false) => "I'm sulking, not gonna greet anymore.",
        (Greeting::Goodbye, true) => "I'll be sorry when people leave!",
        (Greeting::Goodbye, false) => "They leave, they're dead to me.",
    };
    reply(bot, msg, answer).await
}

/// `/setwelcome` and `/setgoodbye`.
pub(crate) async fn set_greeting(
    greeting: Greeting,
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    args: &str,
) -> anyhow::Result<()> {
    let Some(user_id) = authorized_admin(bot, msg, state).await? else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    let mut preference = state.store.preference(greeting, chat_id.0).await?;
    match extract_content(msg, args) {
        Some(GreetingContent::Media(kind, file_id)) => preference.set_media(kind, file_id),
        Some(GreetingContent::Text(raw)) => {
            let parsed = buttons::parse(&raw);
            if parsed.text.is_empty() {
                return reply(bot, msg, NOTHING_TO_SET).await;
            }
            preference.set_text(parsed.text, parsed.buttons);
        }
        None => return reply(bot, msg, NOTHING_TO_SET).await,
    }

    state.store.set_preference(greeting, &preference).await?;
    log_action(user_id, chat_id, &format!("set the {} message ({:?})", greeting, preference.kind));

    reply(bot, msg, format!("Successfully set custom {} message!", greeting)).await
}

/// `/resetwelcome` and `/resetgoodbye`.
pub(crate) async fn reset_greeting(
    greeting: Greeting,
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = authorized_admin(bot, msg, state).await? else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    let mut preference = state.store.preference(greeting, chat_id.0).await?;
    preference.reset(greeting);
    state.store.set_preference(greeting, &preference).await?;
    log_action(user_id, chat_id, &format!("reset the {} message", greeting));

    reply(
        bot,
        msg,
        format!("Successfully reset {} message to default!", greeting),
    )
    .await
}

pub async fn welcome_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    show_or_toggle(Greeting::Welcome, &bot, &msg, &state, &args).await
}

pub async fn setwelcome_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    set_greeting(Greeting::Welcome, &bot, &msg, &state, &args).await
}

pub async fn resetwelcome_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    reset_greeting(Greeting::Welcome, &bot, &msg, &state).await
}

/// Handle /welcomemute - show or set the join gate.
pub async fn welcomemute_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user_id) = authorized_admin(&bot, &msg, &state).await? else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    let Some(arg) = args.split_whitespace().next() else {
        let current = state.store.join_gate(chat_id.0).await?;
        return reply_html(
            &bot,
            &msg,
            format!(
                "Give me a setting! Choose one of: <code>off</code>/<code>no</code>, \
                 <code>soft</code> or <code>strong</code> only!\nCurrent setting: <code>{}</code>",
                current
            ),
        )
        .await;
    };

    let Ok(policy) = arg.parse::<JoinGatePolicy>() else {
        return reply_html(
            &bot,
            &msg,
            "Please enter <code>off</code>/<code>no</code>, <code>soft</code> or <code>strong</code>!",
        )
        .await;
    };

    state.store.set_join_gate(chat_id.0, policy).await?;
    log_action(user_id, chat_id, &format!("set welcome mute to {}", policy));

    let answer = match policy {
        JoinGatePolicy::Off => "I will no longer mute people on joining!",
        JoinGatePolicy::Soft => "I will restrict users' permission to send media for 24 hours.",
        JoinGatePolicy::Strong => {
            "I will now mute people when they join until they click on the button to be unmuted."
        }
    };
    reply(&bot, &msg, answer).await
}

/// Handle /cleanwelcome - toggle deleting the previous welcome.
pub async fn cleanwelcome_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user_id) = authorized_admin(&bot, &msg, &state).await? else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    let Some(arg) = args.split_whitespace().next() else {
        let settings = state.store.chat_settings(chat_id.0).await?;
        let answer = if settings.clean_welcome {
            "I should be deleting the previous welcome message when someone new joins."
        } else {
            "I'm currently not deleting old welcome messages!"
        };
        return reply(&bot, &msg, answer).await;
    };

    let Some(enabled) = parse_toggle(arg) else {
        return reply(&bot, &msg, TOGGLE_USAGE).await;
    };

    state.store.set_clean_welcome(chat_id.0, enabled).await?;
    log_action(user_id, chat_id, &format!("turned clean welcome {}", on_off(enabled)));

    let answer = if enabled {
        "I'll try to delete old welcome messages!"
    } else {
        "I won't delete old welcome messages."
    };
    reply(&bot, &msg, answer).await
}

/// Handle /cleanservice - toggle deleting join/leave service messages.
pub async fn cleanservice_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user_id) = authorized_admin(&bot, &msg, &state).await? else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    let Some(arg) = args.split_whitespace().next() else {
        let current = state.store.clean_service(chat_id.0).await?;
        return reply(
            &bot,
            &msg,
            format!(
                "Welcome clean service is: {}\nUsage is on/yes or off/no",
                on_off(current)
            ),
        )
        .await;
    };

    let Some(enabled) = parse_toggle(arg) else {
        return reply(&bot, &msg, "Invalid option. Usage is on/yes or off/no").await;
    };

    state.store.set_clean_service(chat_id.0, enabled).await?;
    log_action(user_id, chat_id, &format!("turned clean service {}", on_off(enabled)));

    let answer = if enabled {
        "Turned on service messages cleaning!"
    } else {
        "Turned off service messages cleaning."
    };
    reply(&bot, &msg, answer).await
}

/// Handle /welcomehelp.
pub async fn welcomehelp_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if authorized_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    reply_html(&bot, &msg, WELCOME_HELP).await
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn log_action(user_id: UserId, chat_id: ChatId, action: &str) {
    info!("Admin {} in chat {} {}", user_id, chat_id, action);
}
