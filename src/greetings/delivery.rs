//! Greeting delivery with a single plain-text fallback.

use teloxide::types::{ChatId, MessageId};
use tracing::{error, warn};

use crate::platform::{ChatPlatform, ErrorKind, Keyboard};

/// Note appended to the fallback text, per rejection kind.
pub fn fallback_note(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Formatting => {
            "Note: the current message was invalid due to formatting issues. Could be due to the user's name."
        }
        ErrorKind::InvalidButtonUrl => {
            "Note: the current message has an invalid url in one of its buttons. Please update."
        }
        ErrorKind::UnsupportedUrlProtocol => {
            "Note: the current message has buttons which use url protocols that are unsupported by telegram. Please update."
        }
        ErrorKind::WrongUrlHost => "Note: the current message has some bad urls. Please update.",
        ErrorKind::Other => {
            "Note: An error occurred when sending the custom message. Please update."
        }
    }
}

pub fn fallback_text(backup: &str, kind: ErrorKind) -> String {
    format!("{}\n{}", backup, fallback_note(kind))
}

/// Send `text` as HTML with `keyboard`. If the platform rejects it, send
/// `backup` as plain text with a note about the rejection, once.
///
/// Returns the id of whichever message got through. Never fails: a rejected
/// fallback is logged and yields `None`.
pub async fn deliver(
    platform: &dyn ChatPlatform,
    chat_id: ChatId,
    reply_to: Option<MessageId>,
    text: &str,
    keyboard: &Keyboard,
    backup: &str,
) -> Option<MessageId> {
    let err = match platform.send_html(chat_id, text, keyboard, reply_to).await {
        Ok(id) => return Some(id),
        Err(err) => err,
    };

    if err.kind == ErrorKind::Other {
        error!("Failed to send greeting in chat {}: {}", chat_id, err);
    } else {
        warn!("Greeting rejected in chat {}: {}", chat_id, err);
    }

    match platform
        .send_plain(chat_id, &fallback_text(backup, err.kind), reply_to)
        .await
    {
        Ok(id) => Some(id),
        Err(err) => {
            error!("Fallback greeting failed in chat {}: {}", chat_id, err);
            None
        }
    }
}
