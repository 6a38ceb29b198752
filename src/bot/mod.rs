//! Bot module - dispatcher, shared state and the polling/webhook runtime.

pub mod dispatcher;
mod runtime;
mod webhook;

pub use dispatcher::build_dispatcher;
pub use runtime::run;
