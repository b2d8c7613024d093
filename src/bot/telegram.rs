use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::alerts::{format_alert, format_summary, Alert, Priority};
use crate::config::TelegramConfig;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// One inbound chat message, forwarded to the monitor loop.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: MessageChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageChat {
    id: i64,
}

/// Thin Telegram Bot API client: Markdown `sendMessage` out, long-polled
/// `getUpdates` in.
pub struct TelegramClient {
    http_client: Client,
    base_url: String,
    token: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            // Long poll holds the connection open for poll_timeout_secs.
            http_client: Client::builder()
                .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
                .build()
                .unwrap_or_default(),
            base_url: TELEGRAM_API_URL.to_string(),
            token: config.bot_token.clone(),
            poll_timeout_secs: config.poll_timeout_secs,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("sendMessage returned status {}", response.status());
        }
        debug!("Alert sent to {}", chat_id);
        Ok(())
    }

    /// Deliver a deduplicated batch: CRITICAL and HIGH alerts one message
    /// each, the rest folded into a single summary. A short pause between
    /// sends stays under the Bot API rate limit.
    pub async fn send_bulk_alerts(&self, chat_id: &str, alerts: &[Alert]) -> Result<()> {
        let urgent: Vec<&Alert> = alerts
            .iter()
            .filter(|a| a.priority >= Priority::High)
            .collect();
        let remainder: Vec<Alert> = alerts
            .iter()
            .filter(|a| a.priority < Priority::High)
            .cloned()
            .collect();

        for alert in urgent {
            self.send_message(chat_id, &format_alert(alert)).await?;
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        if !remainder.is_empty() {
            self.send_message(chat_id, &format_summary(&remainder))
                .await?;
        }

        Ok(())
    }

    /// Long-poll `getUpdates` forever, forwarding message text to `tx`.
    /// Spawned as a background task; the monitor loop receives from the
    /// channel the way it receives any other event source.
    pub async fn listen(&self, tx: mpsc::UnboundedSender<IncomingMessage>) -> Result<()> {
        info!("📱 Telegram listener started (long poll {}s)", self.poll_timeout_secs);
        let mut offset: i64 = 0;

        loop {
            let updates = match self.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    error!("❌ getUpdates failed: {}", e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };
                let Some(text) = message.text else {
                    continue;
                };
                let incoming = IncomingMessage {
                    chat_id: message.chat.id,
                    text,
                };
                if tx.send(incoming).is_err() {
                    // Receiver dropped, monitor is shutting down.
                    return Ok(());
                }
            }
        }
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let response = self
            .http_client
            .get(self.method_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", self.poll_timeout_secs.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("getUpdates returned status {}", response.status());
        }

        let data: UpdatesResponse = response.json().await?;
        if !data.ok {
            anyhow::bail!("getUpdates response not ok");
        }
        Ok(data.result)
    }
}
