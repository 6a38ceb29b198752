//! Per-chat greeting housekeeping settings.

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::greetings::JoinGatePolicy;

/// Join gate and cleanup settings for one chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatGreetingSettings {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Telegram chat ID (indexed)
    pub chat_id: i64,

    /// Restriction applied to members on join
    #[serde(default)]
    pub join_gate: JoinGatePolicy,

    /// Delete the platform's "user joined/left" service messages
    #[serde(default)]
    pub clean_service: bool,

    /// Delete the previous welcome when a new one is sent
    #[serde(default)]
    pub clean_welcome: bool,

    /// Message id of the last welcome sent while clean welcome was on
    #[serde(default)]
    pub last_welcome_id: Option<i32>,
}

impl ChatGreetingSettings {
    pub fn new(chat_id: i64) -> Self {
        Self {
            id: None,
            chat_id,
            join_gate: JoinGatePolicy::Off,
            clean_service: false,
            clean_welcome: false,
            last_welcome_id: None,
        }
    }
}
