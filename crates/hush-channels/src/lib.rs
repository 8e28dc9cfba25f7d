//! # hush-channels
//!
//! Connections the bot can ride on, and the presence policy wrapped around them.

pub mod evolution;
mod qr;
mod stealth;

pub use qr::generate_qr_terminal;
pub use stealth::StealthConnection;
