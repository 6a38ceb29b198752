//! Permission checks for greeting administration.
//!
//! Admin lookups are cached per (chat, user) so that join bursts and
//! repeated commands do not hammer `getChatMember`. Bot owners bypass
//! every check.

mod checker;

pub use checker::Permissions;
