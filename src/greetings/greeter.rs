//! Member event handling: welcome, goodbye, join gate and verification.
//!
//! [`Greeter`] only talks to the outside world through a [`ChatPlatform`]
//! and a [`GreetingStore`], so every flow here runs against fakes in tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use teloxide::types::{ChatId, MessageId, UserId};
use tracing::{debug, info, warn};

use super::buttons;
use super::delivery::deliver;
use super::join_gate::{self, GateDecision, JoinGatePolicy, VerifyOutcome};
use super::template::{TemplateFields, display_first_name, fill_first, render};
use super::Member;
use crate::database::{Greeting, GreetingPreference, GreetingStore, VerificationRecord};
use crate::platform::{ChatPlatform, Restriction};
use crate::utils::mention_html;

pub const OWNER_WELCOME: &str = "Master is in the houseeee, let's get this party started!";
pub const OWNER_GOODBYE: &str = "RIP Master";

/// Who the bot is and whom it never gates.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub id: UserId,
    pub name: String,
    pub owner_ids: Vec<u64>,
    /// Allow-listed users, exempt from the join gate in every chat.
    pub protected_ids: Vec<u64>,
}

impl BotIdentity {
    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_ids.contains(&user_id.0)
    }

    fn is_allow_listed(&self, user_id: UserId) -> bool {
        self.owner_ids.contains(&user_id.0) || self.protected_ids.contains(&user_id.0)
    }
}

/// One "new chat members" service message.
#[derive(Debug, Clone)]
pub struct JoinEvent {
    pub chat_id: ChatId,
    pub chat_title: String,
    pub service_message: MessageId,
    /// Sender of the service message: the member themself, or whoever added them.
    pub added_by: Member,
    pub members: Vec<Member>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LeaveEvent {
    pub chat_id: ChatId,
    pub chat_title: String,
    pub service_message: MessageId,
    pub member: Member,
}

/// A press on the join confirmation button.
#[derive(Debug, Clone)]
pub struct VerifyPress {
    pub chat_id: ChatId,
    pub callback_id: String,
    pub presser: UserId,
    pub payload: String,
    /// The prompt carrying the button, deleted once verified.
    pub prompt_message: Option<MessageId>,
}

pub struct Greeter {
    store: Arc<dyn GreetingStore>,
    platform: Arc<dyn ChatPlatform>,
    identity: BotIdentity,
}

impl Greeter {
    pub fn new(
        store: Arc<dyn GreetingStore>,
        platform: Arc<dyn ChatPlatform>,
        identity: BotIdentity,
    ) -> Self {
        Self {
            store,
            platform,
            identity,
        }
    }

    pub async fn member_joined(&self, event: &JoinEvent) -> anyhow::Result<()> {
        let chat_id = event.chat_id;
        let settings = self.store.chat_settings(chat_id.0).await?;
        let preference = self.store.preference(Greeting::Welcome, chat_id.0).await?;

        let reply_to = self
            .clean_service(chat_id, event.service_message, settings.clean_service)
            .await;

        let count = if preference.enabled && preference.kind.media().is_none() {
            self.member_count(chat_id).await
        } else {
            0
        };

        let mut last_welcome = None;
        for member in &event.members {
            if self.identity.is_owner(member.id) {
                self.send_notice(chat_id, OWNER_WELCOME, reply_to).await;
                continue;
            }

            if member.id == self.identity.id {
                let text = format!(
                    "Hey {}, I'm {}! Thank you for adding me to {}",
                    display_first_name(&event.added_by),
                    self.identity.name,
                    event.chat_title
                );
                self.send_notice(chat_id, &text, reply_to).await;
                continue;
            }

            if preference.enabled {
                let sent = self
                    .send_greeting(
                        Greeting::Welcome,
                        &preference,
                        chat_id,
                        &event.chat_title,
                        member,
                        count,
                        reply_to,
                    )
                    .await;
                last_welcome = sent.or(last_welcome);
            }

            self.apply_gate(chat_id, member, settings.join_gate, event.joined_at, reply_to)
                .await;
        }

        if settings.clean_welcome
            && let Some(new_id) = last_welcome
        {
            if let Some(previous) = settings.last_welcome_id
                && let Err(e) = self.platform.delete_message(chat_id, MessageId(previous)).await
            {
                debug!("Could not delete previous welcome in chat {}: {}", chat_id, e);
            }

            let mut fresh = self.store.chat_settings(chat_id.0).await?;
            fresh.last_welcome_id = Some(new_id.0);
            self.store.set_chat_settings(&fresh).await?;
        }

        Ok(())
    }

    pub async fn member_left(&self, event: &LeaveEvent) -> anyhow::Result<()> {
        let chat_id = event.chat_id;
        let settings = self.store.chat_settings(chat_id.0).await?;

        let reply_to = self
            .clean_service(chat_id, event.service_message, settings.clean_service)
            .await;

        if event.member.id == self.identity.id {
            return Ok(());
        }

        let preference = self.store.preference(Greeting::Goodbye, chat_id.0).await?;
        if !preference.enabled {
            return Ok(());
        }

        if self.identity.is_owner(event.member.id) {
            self.send_notice(chat_id, OWNER_GOODBYE, reply_to).await;
            return Ok(());
        }

        let count = if preference.kind.media().is_none() {
            self.member_count(chat_id).await
        } else {
            0
        };

        self.send_greeting(
            Greeting::Goodbye,
            &preference,
            chat_id,
            &event.chat_title,
            &event.member,
            count,
            reply_to,
        )
        .await;

        Ok(())
    }

    /// Handle a confirmation press. Only the member the button was made for
    /// gets unmuted.
    pub async fn verify_pressed(&self, press: &VerifyPress) -> anyhow::Result<VerifyOutcome> {
        let outcome = VerifyOutcome::check(&press.payload, press.presser.0);

        if let Err(e) = self
            .platform
            .answer_callback(&press.callback_id, outcome.answer())
            .await
        {
            warn!("Failed to answer verification press: {}", e);
        }

        if outcome == VerifyOutcome::Mismatch {
            debug!(
                "User {} pressed someone else's verification button in chat {}",
                press.presser, press.chat_id
            );
            return Ok(outcome);
        }

        if let Err(e) = self
            .platform
            .restrict(press.chat_id, press.presser, Restriction::Lift)
            .await
        {
            warn!(
                "Failed to unmute user {} in chat {}: {}",
                press.presser, press.chat_id, e
            );
        }

        if let Some(prompt) = press.prompt_message
            && let Err(e) = self.platform.delete_message(press.chat_id, prompt).await
        {
            debug!("Could not delete verification prompt: {}", e);
        }

        let chat_id = press.chat_id.0;
        let user_id = press.presser.0;
        if !self.store.clear_verification(chat_id, user_id).await? {
            debug!("No pending verification for user {} in chat {}", user_id, chat_id);
        }
        self.store
            .set_verification(&VerificationRecord::passed(chat_id, user_id))
            .await?;

        info!("User {} verified in chat {}", user_id, chat_id);
        Ok(outcome)
    }

    /// Send the stored greeting as an admin would see it, placeholders unfilled.
    /// With `noformat` the buttons are shown as directive text instead.
    pub async fn preview(
        &self,
        greeting: Greeting,
        chat_id: ChatId,
        reply_to: Option<MessageId>,
        noformat: bool,
    ) -> anyhow::Result<()> {
        let preference = self.store.preference(greeting, chat_id.0).await?;

        if let Some(kind) = preference.kind.media()
            && let Some(file_id) = preference.media_file_id.as_deref()
        {
            if let Err(e) = self
                .platform
                .send_media(chat_id, kind, file_id, reply_to)
                .await
            {
                warn!("Failed to send {} preview in chat {}: {}", greeting, chat_id, e);
            }
            return Ok(());
        }

        if noformat {
            let raw = buttons::with_directives(&preference.template, &preference.buttons);
            self.send_notice(chat_id, &raw, reply_to).await;
        } else {
            let keyboard = buttons::layout(&preference.buttons);
            deliver(
                self.platform.as_ref(),
                chat_id,
                reply_to,
                &preference.template,
                &keyboard,
                greeting.default_template(),
            )
            .await;
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn send_greeting(
        &self,
        greeting: Greeting,
        preference: &GreetingPreference,
        chat_id: ChatId,
        chat_title: &str,
        member: &Member,
        count: u32,
        reply_to: Option<MessageId>,
    ) -> Option<MessageId> {
        if let Some(kind) = preference.kind.media()
            && let Some(file_id) = preference.media_file_id.as_deref()
        {
            return match self
                .platform
                .send_media(chat_id, kind, file_id, reply_to)
                .await
            {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("Failed to send {} media in chat {}: {}", greeting, chat_id, e);
                    None
                }
            };
        }

        let fields = TemplateFields::new(member, chat_title, count);
        let text = render(&preference.template, &fields);
        let keyboard = buttons::layout(&preference.buttons);
        let backup = fill_first(greeting.default_template(), member);

        deliver(
            self.platform.as_ref(),
            chat_id,
            reply_to,
            &text,
            &keyboard,
            &backup,
        )
        .await
    }

    /// Restrict a new member as the policy says. Failures are logged per
    /// member. A verify mute is always followed by the prompt, stored record
    /// or not.
    async fn apply_gate(
        &self,
        chat_id: ChatId,
        member: &Member,
        policy: JoinGatePolicy,
        joined_at: DateTime<Utc>,
        reply_to: Option<MessageId>,
    ) {
        if policy == JoinGatePolicy::Off {
            return;
        }

        let exempt = self.is_exempt(chat_id, member.id).await;
        let decision = join_gate::decide(policy, exempt, joined_at);
        let Some(restriction) = decision.restriction() else {
            return;
        };

        if let Err(e) = self.platform.restrict(chat_id, member.id, restriction).await {
            warn!(
                "Failed to restrict user {} in chat {}: {}",
                member.id, chat_id, e
            );
            return;
        }

        if decision == GateDecision::Verify {
            if let Err(e) = self
                .store
                .set_verification(&VerificationRecord::pending(chat_id.0, member.id.0))
                .await
            {
                warn!(
                    "Failed to store pending verification for user {} in chat {}: {}",
                    member.id, chat_id, e
                );
            }

            let prompt = format!(
                "Hey {}!\nClick the button below to start talking.",
                mention_html(member.id.0, display_first_name(member))
            );
            let keyboard = join_gate::verify_keyboard(member.id.0);
            if let Err(e) = self
                .platform
                .send_html(chat_id, &prompt, &keyboard, reply_to)
                .await
            {
                warn!("Failed to send verification prompt in chat {}: {}", chat_id, e);
            }
        }

        debug!("Applied {} join gate to user {} in chat {}", policy, member.id, chat_id);
    }

    /// Allow-listed users, chat admins and members who already verified.
    /// Failed lookups count as "not exempt".
    async fn is_exempt(&self, chat_id: ChatId, user_id: UserId) -> bool {
        if self.identity.is_allow_listed(user_id) {
            return true;
        }

        match self.platform.is_chat_admin(chat_id, user_id).await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => warn!("Admin lookup failed for user {} in chat {}: {}", user_id, chat_id, e),
        }

        match self.store.verification(chat_id.0, user_id.0).await {
            Ok(record) => record.is_some_and(|record| record.is_passed()),
            Err(e) => {
                warn!(
                    "Verification lookup failed for user {} in chat {}: {}",
                    user_id, chat_id, e
                );
                false
            }
        }
    }

    /// Delete the service message when asked to. Returns what greetings
    /// should reply to.
    async fn clean_service(
        &self,
        chat_id: ChatId,
        service_message: MessageId,
        enabled: bool,
    ) -> Option<MessageId> {
        if !enabled {
            return Some(service_message);
        }
        if let Err(e) = self.platform.delete_message(chat_id, service_message).await {
            debug!("Could not delete service message in chat {}: {}", chat_id, e);
        }
        None
    }

    async fn member_count(&self, chat_id: ChatId) -> u32 {
        self.platform.member_count(chat_id).await.unwrap_or_else(|e| {
            warn!("Failed to get member count for chat {}: {}", chat_id, e);
            0
        })
    }

    async fn send_notice(&self, chat_id: ChatId, text: &str, reply_to: Option<MessageId>) {
        if let Err(e) = self.platform.send_plain(chat_id, text, reply_to).await {
            warn!("Failed to send message in chat {}: {}", chat_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::database::{MemoryStore, VerificationState};
    use crate::greetings::testing::{FakePlatform, Sent};
    use crate::platform::{ErrorKind, InlineButton, MediaKind};

    const CHAT: ChatId = ChatId(-100);
    const SERVICE: MessageId = MessageId(10);
    const BOT: u64 = 999;
    const OWNER: u64 = 1;
    const PROTECTED: u64 = 2;

    struct Harness {
        store: Arc<MemoryStore>,
        platform: Arc<FakePlatform>,
        greeter: Greeter,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(FakePlatform::new());
        let identity = BotIdentity {
            id: UserId(BOT),
            name: "Kaguya".into(),
            owner_ids: vec![OWNER],
            protected_ids: vec![PROTECTED],
        };
        let greeter = Greeter::new(store.clone(), platform.clone(), identity);
        Harness {
            store,
            platform,
            greeter,
        }
    }

    fn join(members: Vec<Member>) -> JoinEvent {
        JoinEvent {
            chat_id: CHAT,
            chat_title: "Test Chat".into(),
            service_message: SERVICE,
            added_by: Member::new(50, "Adder"),
            members,
            joined_at: Utc::now(),
        }
    }

    fn leave(member: Member) -> LeaveEvent {
        LeaveEvent {
            chat_id: CHAT,
            chat_title: "Test Chat".into(),
            service_message: SERVICE,
            member,
        }
    }

    fn press(presser: u64, payload: &str, prompt: i32) -> VerifyPress {
        VerifyPress {
            chat_id: CHAT,
            callback_id: "cb".into(),
            presser: UserId(presser),
            payload: payload.into(),
            prompt_message: Some(MessageId(prompt)),
        }
    }

    fn bob() -> Member {
        Member::new(7, "Bob")
    }

    async fn set_welcome_text(h: &Harness, raw: &str) {
        let parsed = buttons::parse(raw);
        let mut pref = h.store.preference(Greeting::Welcome, CHAT.0).await.unwrap();
        pref.set_text(parsed.text, parsed.buttons);
        h.store.set_preference(Greeting::Welcome, &pref).await.unwrap();
    }

    fn prompt_for(member: &Member) -> Sent {
        Sent::Html {
            chat_id: CHAT,
            text: format!(
                "Hey <a href=\"tg://user?id={}\">{}</a>!\nClick the button below to start talking.",
                member.id.0, member.first_name
            ),
            keyboard: join_gate::verify_keyboard(member.id.0),
            reply_to: Some(SERVICE),
        }
    }

    #[tokio::test]
    async fn test_default_welcome() {
        let h = harness();
        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        assert_eq!(
            h.platform.sent(),
            vec![Sent::Html {
                chat_id: CHAT,
                text: "Hey Bob, how are you?".into(),
                keyboard: vec![],
                reply_to: Some(SERVICE),
            }]
        );
        assert!(h.platform.restrictions().is_empty());
    }

    #[tokio::test]
    async fn test_custom_welcome_with_fields_and_buttons() {
        let h = harness();
        set_welcome_text(
            &h,
            "Hi {first} of {chatname}, you are #{count} {unknown}\n[Rules](buttonurl://t.me/rules)\n[Site](buttonurl://example.com:same)",
        )
        .await;

        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        assert_eq!(
            h.platform.sent(),
            vec![Sent::Html {
                chat_id: CHAT,
                text: "Hi Bob of Test Chat, you are #42 {unknown}".into(),
                keyboard: vec![vec![
                    InlineButton::url("Rules", "t.me/rules"),
                    InlineButton::url("Site", "example.com"),
                ]],
                reply_to: Some(SERVICE),
            }]
        );
    }

    #[tokio::test]
    async fn test_names_cannot_inject_buttons() {
        let h = harness();
        let member = Member::new(7, "[x](buttonurl://evil.com)");
        h.greeter.member_joined(&join(vec![member])).await.unwrap();

        let sent = h.platform.sent();
        assert_eq!(sent[0].text(), "Hey [x](buttonurl://evil.com), how are you?");
        assert!(matches!(&sent[0], Sent::Html { keyboard, .. } if keyboard.is_empty()));
    }

    #[tokio::test]
    async fn test_member_count_failure_renders_zero() {
        let h = harness();
        set_welcome_text(&h, "You are #{count}").await;
        h.platform.fail_member_count();

        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        assert_eq!(h.platform.sent()[0].text(), "You are #0");
    }

    #[tokio::test]
    async fn test_formatting_rejection_uses_default_backup() {
        let h = harness();
        set_welcome_text(&h, "<b>{first}").await;
        h.platform.fail_html(ErrorKind::Formatting);

        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        assert_eq!(
            h.platform.sent(),
            vec![Sent::Plain {
                chat_id: CHAT,
                text: "Hey Bob, how are you?\nNote: the current message was invalid due to formatting issues. Could be due to the user's name.".into(),
                reply_to: Some(SERVICE),
            }]
        );
    }

    #[tokio::test]
    async fn test_media_welcome() {
        let h = harness();
        let mut pref = h.store.preference(Greeting::Welcome, CHAT.0).await.unwrap();
        pref.set_media(MediaKind::Sticker, "sticker-id".into());
        h.store.set_preference(Greeting::Welcome, &pref).await.unwrap();

        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        assert_eq!(
            h.platform.sent(),
            vec![Sent::Media {
                chat_id: CHAT,
                kind: MediaKind::Sticker,
                file_id: "sticker-id".into(),
                reply_to: Some(SERVICE),
            }]
        );
    }

    #[tokio::test]
    async fn test_off_gate_never_restricts() {
        let h = harness();
        h.platform.add_admin(3);

        h.greeter
            .member_joined(&join(vec![bob(), Member::new(3, "Admin")]))
            .await
            .unwrap();

        assert!(h.platform.restrictions().is_empty());
    }

    #[tokio::test]
    async fn test_soft_gate_restricts_for_a_day() {
        let h = harness();
        h.store.set_join_gate(CHAT.0, JoinGatePolicy::Soft).await.unwrap();
        let event = join(vec![bob()]);

        h.greeter.member_joined(&event).await.unwrap();

        assert_eq!(
            h.platform.restrictions(),
            vec![(
                UserId(7),
                Restriction::SoftMute {
                    until: event.joined_at + Duration::hours(24)
                }
            )]
        );
        assert!(h.store.verification(CHAT.0, 7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_strong_gate_mutes_and_prompts() {
        let h = harness();
        h.store.set_join_gate(CHAT.0, JoinGatePolicy::Strong).await.unwrap();
        h.store
            .set_greeting_enabled(Greeting::Welcome, CHAT.0, false)
            .await
            .unwrap();

        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        assert_eq!(h.platform.restrictions(), vec![(UserId(7), Restriction::FullMute)]);
        assert_eq!(h.platform.sent(), vec![prompt_for(&bob())]);
        let record = h.store.verification(CHAT.0, 7).await.unwrap().unwrap();
        assert_eq!(record.state, VerificationState::Pending);
    }

    /// Memory store that refuses verification writes.
    struct VerificationsDown(MemoryStore);

    #[async_trait::async_trait]
    impl GreetingStore for VerificationsDown {
        async fn preference(
            &self,
            greeting: Greeting,
            chat_id: i64,
        ) -> anyhow::Result<GreetingPreference> {
            self.0.preference(greeting, chat_id).await
        }

        async fn set_preference(
            &self,
            greeting: Greeting,
            preference: &GreetingPreference,
        ) -> anyhow::Result<()> {
            self.0.set_preference(greeting, preference).await
        }

        async fn chat_settings(
            &self,
            chat_id: i64,
        ) -> anyhow::Result<crate::database::ChatGreetingSettings> {
            self.0.chat_settings(chat_id).await
        }

        async fn set_chat_settings(
            &self,
            settings: &crate::database::ChatGreetingSettings,
        ) -> anyhow::Result<()> {
            self.0.set_chat_settings(settings).await
        }

        async fn verification(
            &self,
            _chat_id: i64,
            _user_id: u64,
        ) -> anyhow::Result<Option<VerificationRecord>> {
            anyhow::bail!("db down")
        }

        async fn set_verification(&self, _record: &VerificationRecord) -> anyhow::Result<()> {
            anyhow::bail!("db down")
        }

        async fn clear_verification(&self, chat_id: i64, user_id: u64) -> anyhow::Result<bool> {
            self.0.clear_verification(chat_id, user_id).await
        }

        async fn migrate_chat(&self, old_chat_id: i64, new_chat_id: i64) -> anyhow::Result<()> {
            self.0.migrate_chat(old_chat_id, new_chat_id).await
        }
    }

    #[tokio::test]
    async fn test_strong_gate_prompts_every_member_when_records_fail() {
        let store = Arc::new(VerificationsDown(MemoryStore::new()));
        store.set_join_gate(CHAT.0, JoinGatePolicy::Strong).await.unwrap();
        store
            .set_greeting_enabled(Greeting::Welcome, CHAT.0, false)
            .await
            .unwrap();
        let platform = Arc::new(FakePlatform::new());
        let identity = BotIdentity {
            id: UserId(BOT),
            name: "Kaguya".into(),
            owner_ids: vec![OWNER],
            protected_ids: vec![],
        };
        let greeter = Greeter::new(store, platform.clone(), identity);
        let carol = Member::new(8, "Carol");

        greeter
            .member_joined(&join(vec![bob(), carol.clone()]))
            .await
            .unwrap();

        assert_eq!(
            platform.restrictions(),
            vec![
                (UserId(7), Restriction::FullMute),
                (UserId(8), Restriction::FullMute),
            ]
        );
        assert_eq!(platform.sent(), vec![prompt_for(&bob()), prompt_for(&carol)]);
    }

    #[tokio::test]
    async fn test_restrict_failure_skips_prompt_but_still_welcomes() {
        let h = harness();
        h.store.set_join_gate(CHAT.0, JoinGatePolicy::Strong).await.unwrap();
        h.platform.fail_restrict();

        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        assert!(h.platform.restrictions().is_empty());
        let sent = h.platform.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text(), "Hey Bob, how are you?");
        assert!(h.store.verification(CHAT.0, 7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_media_failure_moves_on_to_next_member() {
        let h = harness();
        let mut pref = h.store.preference(Greeting::Welcome, CHAT.0).await.unwrap();
        pref.set_media(MediaKind::Photo, "photo-id".into());
        h.store.set_preference(Greeting::Welcome, &pref).await.unwrap();
        h.store.set_join_gate(CHAT.0, JoinGatePolicy::Soft).await.unwrap();
        h.platform.fail_media(ErrorKind::Other);

        h.greeter
            .member_joined(&join(vec![bob(), Member::new(8, "Carol")]))
            .await
            .unwrap();

        assert!(h.platform.sent().is_empty());
        assert_eq!(h.platform.attempts(), 2);
        assert_eq!(h.platform.restrictions().len(), 2);
    }

    #[tokio::test]
    async fn test_exempt_members_are_never_restricted() {
        for policy in [JoinGatePolicy::Off, JoinGatePolicy::Soft, JoinGatePolicy::Strong] {
            let h = harness();
            h.store.set_join_gate(CHAT.0, policy).await.unwrap();
            h.platform.add_admin(3);
            h.store
                .set_verification(&VerificationRecord::passed(CHAT.0, 4))
                .await
                .unwrap();

            h.greeter
                .member_joined(&join(vec![
                    Member::new(OWNER, "Owner"),
                    Member::new(BOT, "Kaguya"),
                    Member::new(PROTECTED, "Friend"),
                    Member::new(3, "Admin"),
                    Member::new(4, "Verified"),
                ]))
                .await
                .unwrap();

            assert!(h.platform.restrictions().is_empty(), "{policy}");

            let sent = h.platform.sent();
            assert_eq!(sent[0].text(), OWNER_WELCOME);
            assert_eq!(
                sent[1].text(),
                "Hey Adder, I'm Kaguya! Thank you for adding me to Test Chat"
            );
            assert_eq!(sent.len(), 5);
        }
    }

    #[tokio::test]
    async fn test_verify_press_by_someone_else() {
        let h = harness();
        h.store.set_join_gate(CHAT.0, JoinGatePolicy::Strong).await.unwrap();
        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        let outcome = h
            .greeter
            .verify_pressed(&press(8, "user_join_(7)", 102))
            .await
            .unwrap();

        assert_eq!(outcome, VerifyOutcome::Mismatch);
        assert_eq!(
            h.platform.answers(),
            vec![("cb".to_string(), "You're not allowed to do this!".to_string())]
        );
        assert_eq!(h.platform.restrictions(), vec![(UserId(7), Restriction::FullMute)]);
        assert!(h.platform.deleted().is_empty());
        assert!(h.store.verification(CHAT.0, 7).await.unwrap().unwrap().is_pending());
    }

    #[tokio::test]
    async fn test_verify_press_by_the_member() {
        let h = harness();
        h.store.set_join_gate(CHAT.0, JoinGatePolicy::Strong).await.unwrap();
        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        // 101 is the welcome, 102 the prompt
        let outcome = h
            .greeter
            .verify_pressed(&press(7, "user_join_(7)", 102))
            .await
            .unwrap();

        assert_eq!(outcome, VerifyOutcome::Verified);
        assert_eq!(
            h.platform.answers(),
            vec![("cb".to_string(), "Yus! You're a human, Unmuted!".to_string())]
        );
        assert_eq!(
            h.platform.restrictions(),
            vec![
                (UserId(7), Restriction::FullMute),
                (UserId(7), Restriction::Lift)
            ]
        );
        assert_eq!(h.platform.deleted(), vec![MessageId(102)]);
        assert!(h.store.verification(CHAT.0, 7).await.unwrap().unwrap().is_passed());

        // Passed members skip the gate when they come back
        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();
        assert_eq!(h.platform.restrictions().len(), 2);
    }

    #[tokio::test]
    async fn test_clean_service_deletes_and_does_not_reply() {
        let h = harness();
        h.store.set_clean_service(CHAT.0, true).await.unwrap();

        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        assert_eq!(h.platform.deleted(), vec![SERVICE]);
        assert_eq!(h.platform.sent()[0].reply_to(), None);
    }

    #[tokio::test]
    async fn test_clean_service_ignores_delete_failure() {
        let h = harness();
        h.store.set_clean_service(CHAT.0, true).await.unwrap();
        h.platform.fail_delete();

        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        assert_eq!(h.platform.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_clean_welcome_replaces_previous() {
        let h = harness();
        let mut settings = h.store.chat_settings(CHAT.0).await.unwrap();
        settings.clean_welcome = true;
        settings.last_welcome_id = Some(55);
        h.store.set_chat_settings(&settings).await.unwrap();

        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        assert_eq!(h.platform.deleted(), vec![MessageId(55)]);
        let settings = h.store.chat_settings(CHAT.0).await.unwrap();
        assert_eq!(settings.last_welcome_id, Some(101));
    }

    #[tokio::test]
    async fn test_clean_welcome_keeps_previous_when_nothing_sent() {
        let h = harness();
        h.store.set_clean_welcome(CHAT.0, true).await.unwrap();
        h.store
            .set_greeting_enabled(Greeting::Welcome, CHAT.0, false)
            .await
            .unwrap();

        h.greeter.member_joined(&join(vec![bob()])).await.unwrap();

        assert!(h.platform.deleted().is_empty());
        assert_eq!(h.store.chat_settings(CHAT.0).await.unwrap().last_welcome_id, None);
    }

    #[tokio::test]
    async fn test_goodbye() {
        let h = harness();
        h.greeter.member_left(&leave(bob())).await.unwrap();
        assert_eq!(h.platform.sent()[0].text(), "Nice knowing ya!");
        assert_eq!(h.platform.sent()[0].reply_to(), Some(SERVICE));
    }

    #[tokio::test]
    async fn test_goodbye_special_members() {
        let h = harness();
        h.greeter.member_left(&leave(Member::new(BOT, "Kaguya"))).await.unwrap();
        assert!(h.platform.sent().is_empty());

        h.greeter.member_left(&leave(Member::new(OWNER, "Owner"))).await.unwrap();
        assert_eq!(h.platform.sent()[0].text(), "RIP Master");
    }

    #[tokio::test]
    async fn test_goodbye_disabled() {
        let h = harness();
        h.store
            .set_greeting_enabled(Greeting::Goodbye, CHAT.0, false)
            .await
            .unwrap();

        h.greeter.member_left(&leave(bob())).await.unwrap();

        assert!(h.platform.sent().is_empty());
    }

    #[tokio::test]
    async fn test_preview() {
        let h = harness();
        set_welcome_text(&h, "Hi {first}\n[Rules](buttonurl://t.me/rules:same)").await;

        h.greeter
            .preview(Greeting::Welcome, CHAT, None, true)
            .await
            .unwrap();
        h.greeter
            .preview(Greeting::Welcome, CHAT, None, false)
            .await
            .unwrap();

        let sent = h.platform.sent();
        assert_eq!(
            sent[0],
            Sent::Plain {
                chat_id: CHAT,
                text: "Hi {first}\n[Rules](buttonurl://t.me/rules:same)".into(),
                reply_to: None,
            }
        );
        assert_eq!(
            sent[1],
            Sent::Html {
                chat_id: CHAT,
                text: "Hi {first}".into(),
                keyboard: vec![vec![InlineButton::url("Rules", "t.me/rules")]],
                reply_to: None,
            }
        );
    }
}
