//! Welcome/goodbye greetings and the join gate.
//!
//! - [`template`] fills `{placeholder}` fields into admin templates
//! - [`buttons`] extracts `[label](buttonurl://url)` directives
//! - [`join_gate`] decides how a new member is restricted
//! - [`delivery`] sends a greeting with one plain-text fallback
//! - [`greeter`] wires the above to member events

pub mod buttons;
pub mod delivery;
pub mod greeter;
pub mod join_gate;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

use teloxide::types::{User, UserId};

pub use greeter::{BotIdentity, Greeter, JoinEvent, LeaveEvent, VerifyPress};
pub use join_gate::JoinGatePolicy;

/// The parts of a chat member the greetings need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl Member {
    pub fn new(id: u64, first_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            first_name: first_name.into(),
            last_name: None,
            username: None,
        }
    }
}

impl From<&User> for Member {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
        }
    }
}
