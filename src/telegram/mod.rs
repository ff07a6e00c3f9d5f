// Telegram bot: Bot API client and the long-poll loop.
//
// Commands are parsed and answered in `commands`; this module only moves
// updates in and replies out.

pub mod commands;

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::auth::CallerId;
use crate::clock::Clock;
use crate::controller::StatusController;

const API_BASE: &str = "https://api.telegram.org";
/// Long-poll timeout passed to `getUpdates`.
const POLL_TIMEOUT_SECS: u64 = 30;
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram API error: {0}")]
    Api(String),
}

// ── Bot API types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'a str,
}

// ── Client ───────────────────────────────────────────────────────────

/// Minimal Telegram Bot API client.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self, TelegramError> {
        let http = reqwest::Client::builder()
            // Must outlast the long-poll timeout
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()?;
        Ok(Self {
            http,
            base_url: format!("{API_BASE}/bot{token}"),
        })
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TelegramError> {
        let response: ApiResponse<T> = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        match response {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(TelegramError::Api(
                description.unwrap_or_else(|| format!("{method} failed")),
            )),
        }
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: POLL_TIMEOUT_SECS,
                allowed_updates: &["message"],
            },
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id,
                    text,
                    parse_mode: "Markdown",
                },
            )
            .await?;
        Ok(())
    }
}

// ── Poll loop ────────────────────────────────────────────────────────

/// Answer one incoming message. Returns `None` for messages that are not commands.
pub fn reply_to(
    message: &Message,
    controller: &StatusController,
    clock: &dyn Clock,
) -> Option<String> {
    let text = message.text.as_deref()?;
    let command = commands::parse_command(text)?;
    let caller = message
        .from
        .as_ref()
        .map(|u| CallerId::telegram(u.id, u.username.clone()))?;
    Some(commands::handle_command(command, &caller, controller, clock))
}

/// Spawn the long-poll loop. Transport errors back off and retry forever.
pub fn spawn_bot(
    client: TelegramClient,
    controller: Arc<StatusController>,
    clock: Arc<dyn Clock>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Starting Telegram bot polling...");
        let mut offset = 0;
        loop {
            let updates = match client.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::error!("Telegram polling failed: {e}");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };
                let Some(reply) = reply_to(&message, &controller, clock.as_ref()) else {
                    continue;
                };
                if let Err(e) = client.send_message(message.chat.id, &reply).await {
                    tracing::error!("Failed to send Telegram reply: {e}");
                }
            }
        }
    })
}
