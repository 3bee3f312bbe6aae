//! Telegram Bot API transport
//!
//! A thin `reqwest` client for the handful of methods the form needs, plus
//! the long-polling loop that feeds updates to the runtime.

mod client;
mod error;
pub mod poller;
pub mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use poller::run_poller;
