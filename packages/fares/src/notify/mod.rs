//! Notification transports.

pub mod telegram;

pub use telegram::{NoopNotifier, TelegramNotifier};
