//! # hush-auth
//!
//! Who may talk to the bot: the JSON-backed authorization store, plus an
//! optional SQLite audit trail of dispatch outcomes.

pub mod audit;
mod store;

pub use store::{AuthStore, AuthorizationSet, RegisterOutcome};
