//! Core logic for cleanbot: watch one Telegram chat and delete every message
//! after a fixed delay.
//!
//! This crate is framework-agnostic. The Bot API lives behind the `BotApi` port,
//! implemented in `cleanbot-telegram`; the HTTP status surface lives in
//! `cleanbot-status`.

pub mod config;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod logging;
pub mod poller;
pub mod ports;
pub mod scheduler;
pub mod stats;

#[cfg(test)]
mod testing;

pub use errors::{ApiError, Error, RejectKind, Result};
