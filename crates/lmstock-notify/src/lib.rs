//! Telegram delivery of stock alerts, error notices and run summaries.

pub mod client;
pub mod error;
pub mod format;
pub mod notifier;
mod retry;
pub mod types;

pub use client::TelegramNotifier;
pub use error::NotifyError;
pub use format::{AlertItem, RunSummary};
pub use notifier::Notifier;
pub use types::BotUser;
