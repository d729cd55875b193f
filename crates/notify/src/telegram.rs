use async_trait::async_trait;
use bolsa_core::notify::error::NotifyError;
use bolsa_core::notify::port::Notifier;
use serde::Serialize;
use std::time::Duration;

const API_BASE: &str = "https://api.telegram.org";

/// # Summary
/// A notifier implementation that sends messages via Telegram Bot API.
///
/// # Invariants
/// * `bot_token` must be valid.
/// * `chat_id` must be accessible by the bot.
/// * Every request is bounded by the client timeout; there is no retry.
pub struct TelegramNotifier {
    /// The Bot API token.
    bot_token: String,
    /// The target Chat ID.
    chat_id: String,
    /// The HTTP client used for requests.
    client: reqwest::Client,
    /// API root, overridable for self-hosted Bot API servers.
    base_url: String,
}

/// # Summary
/// Payload structure for Telegram `sendMessage` API.
#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    /// # Summary
    /// Creates a new `TelegramNotifier`.
    ///
    /// # Logic
    /// Rejects blank credentials, then builds an HTTP client bounded by `timeout`.
    ///
    /// # Arguments
    /// * `bot_token` - The Telegram Bot API token.
    /// * `chat_id` - The target chat ID to send messages to.
    /// * `timeout` - Upper bound for a single delivery attempt.
    ///
    /// # Returns
    /// * A new instance of `TelegramNotifier`, or `NotifyError::Config`.
    pub fn new(bot_token: String, chat_id: String, timeout: Duration) -> Result<Self, NotifyError> {
        if bot_token.trim().is_empty() || chat_id.trim().is_empty() {
            return Err(NotifyError::Config(
                "Telegram bot token and chat id must not be empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            bot_token,
            chat_id,
            client,
            base_url: API_BASE.to_string(),
        })
    }

    /// Points the notifier at a different Bot API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn channel(&self) -> &str {
        "telegram"
    }

    /// # Summary
    /// Sends a notification to the configured Telegram chat.
    ///
    /// # Logic
    /// 1. Constructs the Telegram API URL.
    /// 2. Sends `content` as plain text; the alert line already names the ticker,
    ///    so `subject` is not repeated.
    /// 3. Checks the response status and returns success or failure.
    ///
    /// # Returns
    /// * `Ok(())` if the message was sent successfully.
    /// * `Err(NotifyError)` if a network error occurs or the API returns a non-success status.
    async fn notify(&self, _subject: &str, content: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);

        let payload = TelegramMessage {
            chat_id: &self.chat_id,
            text: content,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            // reqwest embeds the URL (and with it the token) in its errors
            .map_err(|e| NotifyError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Platform(format!(
                "Telegram API error {}: {}",
                status, error_text
            )));
        }

        Ok(())
    }
}
