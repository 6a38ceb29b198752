//! Recording fakes for greeting tests.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use teloxide::types::{ChatId, MessageId, UserId};

use crate::platform::{
    ChatPlatform, ErrorKind, Keyboard, MediaKind, PlatformError, PlatformResult, Restriction,
};

/// A message the fake platform accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Html {
        chat_id: ChatId,
        text: String,
        keyboard: Keyboard,
        reply_to: Option<MessageId>,
    },
    Plain {
        chat_id: ChatId,
        text: String,
        reply_to: Option<MessageId>,
    },
    Media {
        chat_id: ChatId,
        kind: MediaKind,
        file_id: String,
        reply_to: Option<MessageId>,
    },
}

impl Sent {
    pub fn text(&self) -> &str {
        match self {
            Sent::Html { text, .. } | Sent::Plain { text, .. } => text,
            Sent::Media { file_id, .. } => file_id,
        }
    }

    pub fn reply_to(&self) -> Option<MessageId> {
        match self {
            Sent::Html { reply_to, .. }
            | Sent::Plain { reply_to, .. }
            | Sent::Media { reply_to, .. } => *reply_to,
        }
    }
}

#[derive(Default)]
struct State {
    next_id: i32,
    attempts: usize,
    sent: Vec<Sent>,
    restrictions: Vec<(UserId, Restriction)>,
    deleted: Vec<MessageId>,
    answers: Vec<(String, String)>,
    fail_html: Option<ErrorKind>,
    fail_plain: Option<ErrorKind>,
    fail_media: Option<ErrorKind>,
    fail_restrict: bool,
    fail_delete: bool,
    fail_count: bool,
    admins: HashSet<UserId>,
}

/// [`ChatPlatform`] that records every call.
pub struct FakePlatform {
    state: Mutex<State>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 100,
                ..Default::default()
            }),
        }
    }

    pub fn fail_html(&self, kind: ErrorKind) {
        self.state.lock().fail_html = Some(kind);
    }

    pub fn fail_plain(&self, kind: ErrorKind) {
        self.state.lock().fail_plain = Some(kind);
    }

    pub fn fail_media(&self, kind: ErrorKind) {
        self.state.lock().fail_media = Some(kind);
    }

    pub fn fail_restrict(&self) {
        self.state.lock().fail_restrict = true;
    }

    pub fn fail_delete(&self) {
        self.state.lock().fail_delete = true;
    }

    pub fn fail_member_count(&self) {
        self.state.lock().fail_count = true;
    }

    pub fn add_admin(&self, user_id: u64) {
        self.state.lock().admins.insert(UserId(user_id));
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.state.lock().sent.clone()
    }

    /// Send attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }

    pub fn restrictions(&self) -> Vec<(UserId, Restriction)> {
        self.state.lock().restrictions.clone()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.state.lock().deleted.clone()
    }

    pub fn answers(&self) -> Vec<(String, String)> {
        self.state.lock().answers.clone()
    }

    fn record(&self, failure: Option<ErrorKind>, sent: Sent) -> PlatformResult<MessageId> {
        let mut state = self.state.lock();
        state.attempts += 1;
        if let Some(kind) = failure {
            return Err(PlatformError::new(kind, "rejected by fake"));
        }
        state.sent.push(sent);
        state.next_id += 1;
        Ok(MessageId(state.next_id))
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn send_html(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: &Keyboard,
        reply_to: Option<MessageId>,
    ) -> PlatformResult<MessageId> {
        let failure = self.state.lock().fail_html;
        self.record(
            failure,
            Sent::Html {
                chat_id,
                text: text.to_string(),
                keyboard: keyboard.clone(),
                reply_to,
            },
        )
    }

    async fn send_plain(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> PlatformResult<MessageId> {
        let failure = self.state.lock().fail_plain;
        self.record(
            failure,
            Sent::Plain {
                chat_id,
                text: text.to_string(),
                reply_to,
            },
        )
    }

    async fn send_media(
        &self,
        chat_id: ChatId,
        kind: MediaKind,
        file_id: &str,
        reply_to: Option<MessageId>,
    ) -> PlatformResult<MessageId> {
        let failure = self.state.lock().fail_media;
        self.record(
            failure,
            Sent::Media {
                chat_id,
                kind,
                file_id: file_id.to_string(),
                reply_to,
            },
        )
    }

    async fn restrict(
        &self,
        _chat_id: ChatId,
        user_id: UserId,
        restriction: Restriction,
    ) -> PlatformResult<()> {
        let mut state = self.state.lock();
        if state.fail_restrict {
            return Err(PlatformError::new(ErrorKind::Other, "not enough rights"));
        }
        state.restrictions.push((user_id, restriction));
        Ok(())
    }

    async fn delete_message(&self, _chat_id: ChatId, message_id: MessageId) -> PlatformResult<()> {
        let mut state = self.state.lock();
        if state.fail_delete {
            return Err(PlatformError::new(ErrorKind::Other, "message can't be deleted"));
        }
        state.deleted.push(message_id);
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> PlatformResult<()> {
        self.state
            .lock()
            .answers
            .push((callback_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn member_count(&self, _chat_id: ChatId) -> PlatformResult<u32> {
        if self.state.lock().fail_count {
            return Err(PlatformError::new(ErrorKind::Other, "chat not found"));
        }
        Ok(42)
    }

    async fn is_chat_admin(&self, _chat_id: ChatId, user_id: UserId) -> PlatformResult<bool> {
        Ok(self.state.lock().admins.contains(&user_id))
    }
}
