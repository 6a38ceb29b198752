//! Read-through caches for greeting settings and admin lookups.
//!
//! Every repository owns a named [`TypedCache`] built from one of the
//! [`CacheConfig`] presets, so a join burst in a busy chat only hits
//! MongoDB once per setting.

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
