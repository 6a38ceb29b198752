//! Join verification records, keyed by (chat, user).

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationState {
    /// Muted on join, waiting for the confirmation button.
    Pending,
    /// Pressed the confirmation button; skips the gate from now on.
    Passed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub chat_id: i64,
    pub user_id: u64,
    pub state: VerificationState,
    pub created_at: DateTime<Utc>,
}

impl VerificationRecord {
    pub fn pending(chat_id: i64, user_id: u64) -> Self {
        Self::with_state(chat_id, user_id, VerificationState::Pending)
    }

    pub fn passed(chat_id: i64, user_id: u64) -> Self {
        Self::with_state(chat_id, user_id, VerificationState::Passed)
    }

    fn with_state(chat_id: i64, user_id: u64, state: VerificationState) -> Self {
        Self {
            id: None,
            chat_id,
            user_id,
            state,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == VerificationState::Pending
    }

    pub fn is_passed(&self) -> bool {
        self.state == VerificationState::Passed
    }
}
