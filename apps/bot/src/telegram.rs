//! Minimal Telegram Bot API client: long-polled updates and text replies.

use std::time::Duration;

use anyhow::bail;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("https://api.telegram.org/bot{bot_token}"),
        }
    }

    /// Fetches updates after `offset`, blocking server-side for up to
    /// `timeout_s`. The request timeout leaves headroom over the poll
    /// timeout so a quiet chat does not read as an error.
    pub async fn get_updates(&self, offset: i64, timeout_s: u64) -> anyhow::Result<Vec<Update>> {
        let response = self
            .http
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", timeout_s.to_string()),
            ])
            .timeout(Duration::from_secs(timeout_s + 10))
            .send()
            .await?
            .error_for_status()?;
        let body: ApiResponse<Vec<Update>> = response.json().await?;
        if !body.ok {
            bail!(
                "getUpdates rejected: {}",
                body.description.unwrap_or_default()
            );
        }
        Ok(body.result.unwrap_or_default())
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        let response = self
            .http
            .post(format!("{}/sendMessage", self.base_url))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?
            .error_for_status()?;
        let body: ApiResponse<serde_json::Value> = response.json().await?;
        if !body.ok {
            bail!(
                "sendMessage rejected: {}",
                body.description.unwrap_or_default()
            );
        }
        Ok(())
    }
}
