//! Welcome and goodbye preference model.
//!
//! Welcome and goodbye preferences share one shape and live in separate
//! collections.

use std::fmt;

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::common::ButtonSpec;
use crate::platform::MediaKind;

pub const DEFAULT_WELCOME: &str = "Hey {first}, how are you?";
pub const DEFAULT_GOODBYE: &str = "Nice knowing ya!";

/// Which greeting a preference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Greeting {
    Welcome,
    Goodbye,
}

impl Greeting {
    /// Template used when the chat never customized this greeting.
    pub fn default_template(self) -> &'static str {
        match self {
            Greeting::Welcome => DEFAULT_WELCOME,
            Greeting::Goodbye => DEFAULT_GOODBYE,
        }
    }

    pub fn collection_name(self) -> &'static str {
        match self {
            Greeting::Welcome => "welcome",
            Greeting::Goodbye => "goodbye",
        }
    }
}

impl fmt::Display for Greeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_name())
    }
}

/// How a greeting is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    ButtonText,
    Sticker,
    Document,
    Photo,
    Audio,
    Voice,
    Video,
}

impl MessageKind {
    /// Media kind for media greetings, `None` for text greetings.
    pub fn media(self) -> Option<MediaKind> {
        match self {
            MessageKind::Text | MessageKind::ButtonText => None,
            MessageKind::Sticker => Some(MediaKind::Sticker),
            MessageKind::Document => Some(MediaKind::Document),
            MessageKind::Photo => Some(MediaKind::Photo),
            MessageKind::Audio => Some(MediaKind::Audio),
            MessageKind::Voice => Some(MediaKind::Voice),
            MessageKind::Video => Some(MediaKind::Video),
        }
    }
}

impl From<MediaKind> for MessageKind {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Sticker => MessageKind::Sticker,
            MediaKind::Document => MessageKind::Document,
            MediaKind::Photo => MessageKind::Photo,
            MediaKind::Audio => MessageKind::Audio,
            MediaKind::Voice => MessageKind::Voice,
            MediaKind::Video => MessageKind::Video,
        }
    }
}

/// Per-chat welcome or goodbye preference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreetingPreference {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Telegram chat ID (indexed)
    pub chat_id: i64,

    /// Whether the greeting is sent at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Template text with button directives already stripped
    #[serde(default)]
    pub template: String,

    #[serde(default)]
    pub kind: MessageKind,

    /// File id for media greetings
    #[serde(default)]
    pub media_file_id: Option<String>,

    /// Url buttons parsed from the template, in directive order
    #[serde(default)]
    pub buttons: Vec<ButtonSpec>,
}

fn default_enabled() -> bool {
    true
}

impl GreetingPreference {
    /// Default preference for a chat.
    pub fn new(greeting: Greeting, chat_id: i64) -> Self {
        Self {
            id: None,
            chat_id,
            enabled: true,
            template: greeting.default_template().to_string(),
            kind: MessageKind::Text,
            media_file_id: None,
            buttons: Vec::new(),
        }
    }

    /// Replace the content with a text template and its buttons.
    pub fn set_text(&mut self, template: String, buttons: Vec<ButtonSpec>) {
        self.kind = if buttons.is_empty() {
            MessageKind::Text
        } else {
            MessageKind::ButtonText
        };
        self.template = template;
        self.buttons = buttons;
        self.media_file_id = None;
    }

    /// Replace the content with a media file. Text and buttons are dropped.
    pub fn set_media(&mut self, kind: MediaKind, file_id: String) {
        self.kind = kind.into();
        self.media_file_id = Some(file_id);
        self.template.clear();
        self.buttons.clear();
    }

    /// Restore the default template, keeping the enabled flag.
    pub fn reset(&mut self, greeting: Greeting) {
        self.set_text(greeting.default_template().to_string(), Vec::new());
    }
}
