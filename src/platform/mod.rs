//! Chat platform abstraction.
//!
//! Everything the greeting core needs from the bot API goes through
//! [`ChatPlatform`]. The production implementation is [`TelegramPlatform`];
//! tests use a recording fake.
//!
//! Failures are reported as a [`PlatformError`] carrying a structured
//! [`ErrorKind`], so callers never inspect API error strings themselves.

mod telegram;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teloxide::types::{ChatId, MessageId, UserId};
use thiserror::Error;

pub use telegram::TelegramPlatform;

/// Classified reason why the platform rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The text could not be parsed as the requested markup.
    #[error("invalid message formatting")]
    Formatting,
    /// A button carries a url the platform refuses.
    #[error("invalid button url")]
    InvalidButtonUrl,
    /// A button url uses a scheme the platform does not support.
    #[error("unsupported url protocol")]
    UnsupportedUrlProtocol,
    /// A url points to a host the platform refuses.
    #[error("wrong url host")]
    WrongUrlHost,
    #[error("request rejected")]
    Other,
}

/// A rejected platform request.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct PlatformError {
    pub kind: ErrorKind,
    pub message: String,
}

impl PlatformError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Media kinds a greeting can be sent as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Sticker,
    Document,
    Photo,
    Audio,
    Voice,
    Video,
}

impl MediaKind {
    pub const ALL: [MediaKind; 6] = [
        MediaKind::Sticker,
        MediaKind::Document,
        MediaKind::Photo,
        MediaKind::Audio,
        MediaKind::Voice,
        MediaKind::Video,
    ];
}

/// What pressing an inline button does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Url(String),
    Callback(String),
}

/// A single inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub action: ButtonAction,
}

impl InlineButton {
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Url(url.into()),
        }
    }

    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }
}

/// Rows of inline buttons.
pub type Keyboard = Vec<Vec<InlineButton>>;

/// Member restriction applied by the join gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restriction {
    /// Plain text only, lifted by the platform itself at `until`.
    SoftMute { until: DateTime<Utc> },
    /// Nothing may be sent, no expiry.
    FullMute,
    /// Restore normal member rights.
    Lift,
}

/// Operations the greeting core performs against the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Send an HTML-formatted message with an inline keyboard.
    async fn send_html(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: &Keyboard,
        reply_to: Option<MessageId>,
    ) -> PlatformResult<MessageId>;

    /// Send a message without any markup interpretation.
    async fn send_plain(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> PlatformResult<MessageId>;

    /// Send a previously uploaded file by its platform file id.
    async fn send_media(
        &self,
        chat_id: ChatId,
        kind: MediaKind,
        file_id: &str,
        reply_to: Option<MessageId>,
    ) -> PlatformResult<MessageId>;

    async fn restrict(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        restriction: Restriction,
    ) -> PlatformResult<()>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> PlatformResult<()>;

    /// Acknowledge a callback button press with a short notice.
    async fn answer_callback(&self, callback_id: &str, text: &str) -> PlatformResult<()>;

    async fn member_count(&self, chat_id: ChatId) -> PlatformResult<u32>;

    /// Whether the user administers the chat (creator included).
    async fn is_chat_admin(&self, chat_id: ChatId, user_id: UserId) -> PlatformResult<bool>;
}
