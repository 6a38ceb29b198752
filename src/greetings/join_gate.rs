//! Join gate: how newly joined members are restricted.
//!
//! `Off` leaves members alone. `Soft` lets them send plain text only for
//! [`SOFT_MUTE_HOURS`], with the expiry enforced by Telegram. `Strong` mutes
//! them until they press the confirmation button carrying their own id.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::{InlineButton, Keyboard, Restriction};

pub const SOFT_MUTE_HOURS: i64 = 24;

/// Callback data prefix of the confirmation button.
pub const VERIFY_PREFIX: &str = "user_join_";

pub const VERIFY_BUTTON_TEXT: &str = "Yus, I'm a human";
pub const VERIFIED_ANSWER: &str = "Yus! You're a human, Unmuted!";
pub const MISMATCH_ANSWER: &str = "You're not allowed to do this!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinGatePolicy {
    #[default]
    Off,
    Soft,
    Strong,
}

#[derive(Debug, Error)]
#[error("unknown join gate setting `{0}`")]
pub struct UnknownPolicy(String);

impl FromStr for JoinGatePolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "no" => Ok(Self::Off),
            "soft" => Ok(Self::Soft),
            "strong" => Ok(Self::Strong),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for JoinGatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Soft => "soft",
            Self::Strong => "strong",
        })
    }
}

/// What to do with a member who just joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    SoftMute { until: DateTime<Utc> },
    /// Mute and ask for confirmation.
    Verify,
}

impl GateDecision {
    /// Restriction to apply right away, if any.
    pub fn restriction(self) -> Option<Restriction> {
        match self {
            Self::Pass => None,
            Self::SoftMute { until } => Some(Restriction::SoftMute { until }),
            Self::Verify => Some(Restriction::FullMute),
        }
    }
}

/// Decide the gate for one member. Exempt members always pass.
pub fn decide(policy: JoinGatePolicy, exempt: bool, joined_at: DateTime<Utc>) -> GateDecision {
    if exempt {
        return GateDecision::Pass;
    }
    match policy {
        JoinGatePolicy::Off => GateDecision::Pass,
        JoinGatePolicy::Soft => GateDecision::SoftMute {
            until: joined_at + Duration::hours(SOFT_MUTE_HOURS),
        },
        JoinGatePolicy::Strong => GateDecision::Verify,
    }
}

/// Callback payload of the confirmation button, `user_join_(<id>)`.
pub fn verify_payload(user_id: u64) -> String {
    format!("{VERIFY_PREFIX}({user_id})")
}

/// Extract the user id embedded by [`verify_payload`].
pub fn parse_verify_payload(payload: &str) -> Option<u64> {
    payload
        .strip_prefix(VERIFY_PREFIX)?
        .strip_prefix('(')?
        .strip_suffix(')')?
        .parse()
        .ok()
}

/// Keyboard with the single confirmation button for `user_id`.
pub fn verify_keyboard(user_id: u64) -> Keyboard {
    vec![vec![InlineButton::callback(
        VERIFY_BUTTON_TEXT,
        verify_payload(user_id),
    )]]
}

/// Result of a confirmation button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    /// Pressed by someone other than the member it was meant for.
    Mismatch,
}

impl VerifyOutcome {
    pub fn check(payload: &str, presser: u64) -> Self {
        match parse_verify_payload(payload) {
            Some(expected) if expected == presser => Self::Verified,
            _ => Self::Mismatch,
        }
    }

    pub fn answer(self) -> &'static str {
        match self {
            Self::Verified => VERIFIED_ANSWER,
            Self::Mismatch => MISMATCH_ANSWER,
        }
    }
}
