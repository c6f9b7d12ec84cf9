//! Telegram Bot API notifier.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::error::{NotifyError, NotifyResult};
use crate::traits::notifier::Notifier;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Notifier that delivers alerts through a Telegram bot.
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a notifier for the given bot token and chat.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> NotifyResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotifyError::Dispatch(Box::new(e)))?;

        Ok(Self {
            client,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// Create from `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID` env vars.
    pub fn from_env() -> NotifyResult<Self> {
        let bot_token =
            std::env::var("TELEGRAM_BOT_TOKEN").map_err(|_| NotifyError::NotConfigured {
                reason: "TELEGRAM_BOT_TOKEN not set".to_string(),
            })?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").map_err(|_| NotifyError::NotConfigured {
            reason: "TELEGRAM_CHAT_ID not set".to_string(),
        })?;
        Self::new(bot_token, chat_id)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> NotifyResult<()> {
        if self.chat_id.is_empty() || self.chat_id == "YOUR_CHAT_ID_HERE" {
            tracing::warn!("Telegram chat ID not set, skipping alert");
            return Err(NotifyError::NotConfigured {
                reason: "chat ID placeholder".to_string(),
            });
        }

        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API_URL, self.bot_token);
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Dispatch(Box::new(e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Dispatch(
                format!("Telegram API error: {status} - {body}").into(),
            ));
        }

        tracing::info!("Telegram alert sent");
        Ok(())
    }
}

/// Notifier that drops every message; used when no transport is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, _message: &str) -> NotifyResult<()> {
        Ok(())
    }
}
