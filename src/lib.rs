//! Quiz and guided-lab engine behind the lab tutor bot.
//!
//! Everything here is free of Telegram types so it can be driven and tested
//! without a bot token.

pub mod config;
pub mod error;
pub mod lab;
pub mod ledger;
pub mod quiz;
pub mod study;

mod store;
