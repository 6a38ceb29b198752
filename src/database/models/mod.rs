//! Database model exports.

pub mod chat_settings;
pub mod common;
pub mod greeting;
pub mod verification;

pub use chat_settings::ChatGreetingSettings;
pub use common::ButtonSpec;
pub use greeting::{DEFAULT_GOODBYE, DEFAULT_WELCOME, Greeting, GreetingPreference, MessageKind};
pub use verification::{VerificationRecord, VerificationState};
