//! Telegram implementation of [`ChatPlatform`].

use std::collections::HashMap;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use teloxide::prelude::*;
use teloxide::types::{
    ChatPermissions, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, LinkPreviewOptions,
    MessageId, ParseMode, ReplyParameters,
};
use teloxide::{ApiError, RequestError};
use tracing::debug;
use url::Url;

use super::{
    ButtonAction, ChatPlatform, ErrorKind, Keyboard, MediaKind, PlatformError, PlatformResult,
    Restriction,
};
use crate::bot::dispatcher::ThrottledBot;
use crate::permissions::Permissions;

/// Url schemes Telegram accepts for url buttons.
const SUPPORTED_SCHEMES: [&str; 3] = ["http", "https", "tg"];

type MediaSender = fn(
    ThrottledBot,
    ChatId,
    InputFile,
    Option<MessageId>,
) -> BoxFuture<'static, Result<Message, RequestError>>;

macro_rules! media_sender {
    ($name:ident, $method:ident) => {
        fn $name(
            bot: ThrottledBot,
            chat_id: ChatId,
            file: InputFile,
            reply_to: Option<MessageId>,
        ) -> BoxFuture<'static, Result<Message, RequestError>> {
            async move {
                let mut request = bot.$method(chat_id, file);
                if let Some(id) = reply_to {
                    request = request.reply_parameters(ReplyParameters::new(id));
                }
                request.await
            }
            .boxed()
        }
    };
}

media_sender!(send_sticker, send_sticker);
media_sender!(send_document, send_document);
media_sender!(send_photo, send_photo);
media_sender!(send_audio, send_audio);
media_sender!(send_voice, send_voice);
media_sender!(send_video, send_video);

/// Build the media kind -> send function table.
fn media_dispatch_table() -> HashMap<MediaKind, MediaSender> {
    HashMap::from([
        (MediaKind::Sticker, send_sticker as MediaSender),
        (MediaKind::Document, send_document as MediaSender),
        (MediaKind::Photo, send_photo as MediaSender),
        (MediaKind::Audio, send_audio as MediaSender),
        (MediaKind::Voice, send_voice as MediaSender),
        (MediaKind::Video, send_video as MediaSender),
    ])
}

/// Bot API backed platform.
///
/// The media dispatch table is built once, when the platform is created.
pub struct TelegramPlatform {
    bot: ThrottledBot,
    permissions: Permissions,
    media_senders: HashMap<MediaKind, MediaSender>,
}

impl TelegramPlatform {
    pub fn new(bot: ThrottledBot, permissions: Permissions) -> Self {
        Self {
            bot,
            permissions,
            media_senders: media_dispatch_table(),
        }
    }
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn send_html(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: &Keyboard,
        reply_to: Option<MessageId>,
    ) -> PlatformResult<MessageId> {
        let markup = build_markup(keyboard)?;

        let mut request = self
            .bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .link_preview_options(disabled_preview());
        if !keyboard.is_empty() {
            request = request.reply_markup(markup);
        }
        if let Some(id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(id));
        }

        Ok(request.await?.id)
    }

    async fn send_plain(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> PlatformResult<MessageId> {
        let mut request = self.bot.send_message(chat_id, text);
        if let Some(id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(id));
        }

        Ok(request.await?.id)
    }

    async fn send_media(
        &self,
        chat_id: ChatId,
        kind: MediaKind,
        file_id: &str,
        reply_to: Option<MessageId>,
    ) -> PlatformResult<MessageId> {
        let sender = self.media_senders.get(&kind).ok_or_else(|| {
            PlatformError::new(ErrorKind::Other, format!("no sender for media kind {kind:?}"))
        })?;

        let file = InputFile::file_id(file_id.to_string());
        let message = sender(self.bot.clone(), chat_id, file, reply_to).await?;
        Ok(message.id)
    }

    async fn restrict(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        restriction: Restriction,
    ) -> PlatformResult<()> {
        match restriction {
            Restriction::SoftMute { until } => {
                self.bot
                    .restrict_chat_member(chat_id, user_id, ChatPermissions::SEND_MESSAGES)
                    .until_date(until)
                    .await?;
            }
            Restriction::FullMute => {
                self.bot
                    .restrict_chat_member(chat_id, user_id, ChatPermissions::empty())
                    .await?;
            }
            Restriction::Lift => {
                self.bot
                    .restrict_chat_member(chat_id, user_id, member_permissions())
                    .await?;
            }
        }

        debug!("Applied {:?} to user {} in chat {}", restriction, user_id, chat_id);
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> PlatformResult<()> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> PlatformResult<()> {
        self.bot
            .answer_callback_query(callback_id.to_string())
            .text(text)
            .await?;
        Ok(())
    }

    async fn member_count(&self, chat_id: ChatId) -> PlatformResult<u32> {
        Ok(self.bot.get_chat_member_count(chat_id).await?)
    }

    async fn is_chat_admin(&self, chat_id: ChatId, user_id: UserId) -> PlatformResult<bool> {
        self.permissions
            .is_admin(chat_id, user_id)
            .await
            .map_err(|e| PlatformError::new(ErrorKind::Other, e.to_string()))
    }
}

impl From<RequestError> for PlatformError {
    fn from(err: RequestError) -> Self {
        let kind = match &err {
            RequestError::Api(ApiError::ButtonUrlInvalid) => ErrorKind::InvalidButtonUrl,
            RequestError::Api(api) => classify_api_message(&api.to_string()),
            _ => ErrorKind::Other,
        };
        PlatformError::new(kind, err.to_string())
    }
}

/// Map a Bot API error description to an [`ErrorKind`].
fn classify_api_message(description: &str) -> ErrorKind {
    let description = description.to_lowercase();

    if description.contains("can't parse entities")
        || description.contains("can't find end of the entity")
        || description.contains("unsupported start tag")
    {
        ErrorKind::Formatting
    } else if description.contains("button_url_invalid") {
        ErrorKind::InvalidButtonUrl
    } else if description.contains("unsupported url protocol") {
        ErrorKind::UnsupportedUrlProtocol
    } else if description.contains("wrong url host") || description.contains("wrong http url") {
        ErrorKind::WrongUrlHost
    } else {
        ErrorKind::Other
    }
}

/// Convert a [`Keyboard`] to Telegram markup, validating url buttons.
fn build_markup(keyboard: &Keyboard) -> PlatformResult<InlineKeyboardMarkup> {
    let mut rows = Vec::with_capacity(keyboard.len());

    for row in keyboard {
        let mut buttons = Vec::with_capacity(row.len());
        for button in row {
            let button = match &button.action {
                ButtonAction::Url(raw) => {
                    InlineKeyboardButton::url(button.text.clone(), parse_button_url(raw)?)
                }
                ButtonAction::Callback(data) => {
                    InlineKeyboardButton::callback(button.text.clone(), data.clone())
                }
            };
            buttons.push(button);
        }
        rows.push(buttons);
    }

    Ok(InlineKeyboardMarkup::new(rows))
}

/// Parse a button url. Bare hosts like `t.me/foo` get an `https://` prefix.
fn parse_button_url(raw: &str) -> PlatformResult<Url> {
    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) if !raw.contains("://") => Url::parse(&format!("https://{raw}")).map_err(|e| {
            PlatformError::new(ErrorKind::InvalidButtonUrl, format!("{raw}: {e}"))
        })?,
        Err(e) => {
            return Err(PlatformError::new(
                ErrorKind::InvalidButtonUrl,
                format!("{raw}: {e}"),
            ));
        }
    };

    if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
        return Err(PlatformError::new(
            ErrorKind::UnsupportedUrlProtocol,
            format!("{raw}: scheme {}", parsed.scheme()),
        ));
    }

    if parsed.scheme() != "tg" && parsed.host_str().is_none_or(|host| !host.contains('.')) {
        return Err(PlatformError::new(ErrorKind::WrongUrlHost, raw.to_string()));
    }

    Ok(parsed)
}

fn disabled_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

/// Rights restored when a verified member is unmuted.
fn member_permissions() -> ChatPermissions {
    ChatPermissions::SEND_MESSAGES
        | ChatPermissions::SEND_AUDIOS
        | ChatPermissions::SEND_DOCUMENTS
        | ChatPermissions::SEND_PHOTOS
        | ChatPermissions::SEND_VIDEOS
        | ChatPermissions::SEND_VIDEO_NOTES
        | ChatPermissions::SEND_VOICE_NOTES
        | ChatPermissions::SEND_POLLS
        | ChatPermissions::SEND_OTHER_MESSAGES
        | ChatPermissions::ADD_WEB_PAGE_PREVIEWS
        | ChatPermissions::INVITE_USERS
}
