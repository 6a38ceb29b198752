//! MongoDB repositories, one per collection.

mod chat_settings_repository;
mod preference_repository;
mod verification_repository;

pub use chat_settings_repository::ChatSettingsRepository;
pub use preference_repository::PreferenceRepository;
pub use verification_repository::VerificationRepository;
