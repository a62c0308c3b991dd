//! Telegram Bot API delivery.

use crate::error::{truncate_body, DeliveryError, MAX_ERROR_BODY_CHARS};
use crate::reporter::Reporter;
use crate::split::split_message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram's per-message limit, in UTF-16 code units.
pub const MAX_MESSAGE_UTF16: usize = 4096;

/// Bot credentials and target chat.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    /// Bot API root, overridable for tests
    pub api_base: String,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

// Token stays out of logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
}

/// Sends reports through `sendMessage`, splitting long texts.
pub struct TelegramReporter {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramReporter {
    pub fn new(config: TelegramConfig, timeout: Duration) -> Result<Self, DeliveryError> {
        if config.bot_token.trim().is_empty() {
            return Err(DeliveryError::InvalidConfig("bot token is empty".to_string()));
        }
        if config.chat_id.trim().is_empty() {
            return Err(DeliveryError::InvalidConfig("chat id is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::InvalidConfig(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    /// Endpoint as it may appear in logs and errors.
    fn redacted_endpoint(&self) -> String {
        format!(
            "{}/bot<redacted>/sendMessage",
            self.config.api_base.trim_end_matches('/')
        )
    }

    async fn send_chunk(&self, text: &str) -> Result<(), DeliveryError> {
        let payload = SendMessage {
            chat_id: &self.config.chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        // reqwest errors carry the URL, which embeds the token
        let network = |e: reqwest::Error| DeliveryError::Network {
            endpoint: self.redacted_endpoint(),
            reason: e.without_url().to_string(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(network)?;
        let status = response.status();
        let body = response.text().await.map_err(network)?;

        let accepted = status.is_success()
            && serde_json::from_str::<ApiResponse>(&body).is_ok_and(|r| r.ok);
        if !accepted {
            return Err(DeliveryError::Rejected {
                endpoint: self.redacted_endpoint(),
                status: status.as_u16(),
                body: truncate_body(&body, MAX_ERROR_BODY_CHARS),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Reporter for TelegramReporter {
    async fn deliver(&self, text: &str) -> Result<usize, DeliveryError> {
        if text.trim().is_empty() {
            return Err(DeliveryError::EmptyMessage);
        }

        let chunks = split_message(text, MAX_MESSAGE_UTF16);
        let total = chunks.len();
        for (index, chunk) in chunks.iter().enumerate() {
            debug!(part = index + 1, total, "Sending Telegram message");
            if let Err(e) = self.send_chunk(chunk).await {
                error!(sent = index, total, error = %e, "Telegram delivery failed");
                return Err(e);
            }
        }

        info!(messages = total, chat_id = %self.config.chat_id, "Report delivered to Telegram");
        Ok(total)
    }
}
