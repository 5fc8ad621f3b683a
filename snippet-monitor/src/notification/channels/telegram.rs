//! Telegram Bot API notification channel.
//!
//! Sends messages via the Telegram Bot API (`POST /bot<token>/sendMessage`).
//! A single attempt is made per message; failures are returned to the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::NotificationChannel;
use crate::Result;
use crate::notification::message::NotificationMessage;

/// Telegram `sendMessage` text limit (UTF-8 characters).
const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Default Bot API root.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Telegram Bot API token.
    pub bot_token: String,
    /// Target chat ID (user, group, or channel).
    pub chat_id: String,
    /// Parse mode for message formatting (HTML, Markdown, MarkdownV2).
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
    /// Bot API root, overridable for tests.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_parse_mode() -> String {
    "Markdown".to_string()
}

fn default_api_base() -> String {
    TELEGRAM_API_BASE.to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            parse_mode: default_parse_mode(),
            api_base: default_api_base(),
        }
    }
}

impl TelegramConfig {
    /// Build a config when both the bot token and chat id are present and non-blank.
    pub fn from_parts(bot_token: Option<&str>, chat_id: Option<&str>) -> Option<Self> {
        let bot_token = bot_token.map(str::trim).filter(|s| !s.is_empty())?;
        let chat_id = chat_id.map(str::trim).filter(|s| !s.is_empty())?;
        Some(Self {
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            ..Default::default()
        })
    }
}

/// Telegram notification channel.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: Client,
}

impl TelegramChannel {
    /// Create a new Telegram channel.
    pub fn new(config: TelegramConfig) -> Self {
        cloudflare_client::install_rustls_provider();
        Self {
            config,
            client: Client::new(),
        }
    }

    fn send_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn channel_type(&self) -> &'static str {
        "telegram"
    }

    fn is_enabled(&self) -> bool {
        !self.config.bot_token.is_empty() && !self.config.chat_id.is_empty()
    }

    async fn send(&self, message: &NotificationMessage) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let payload = json!({
            "chat_id": self.config.chat_id,
            "text": truncate_message(&message.text, TELEGRAM_MESSAGE_LIMIT),
            "parse_mode": self.config.parse_mode,
        });

        // The URL embeds the bot token, so it is kept out of error messages.
        let response = self
            .client
            .post(self.send_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                crate::Error::notification(format!(
                    "Telegram request failed: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Telegram sendMessage failed: {} - {}", status, body);
            return Err(crate::Error::notification(format!(
                "Telegram sendMessage failed: {} - {}",
                status, body
            )));
        }

        debug!("Telegram notification sent: {}", message.title);
        Ok(())
    }
}

/// Truncate a message to fit within the Telegram character limit.
///
/// Cuts at the last line break inside the budget so Markdown entities,
/// which never span lines here, stay closed.
fn truncate_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let suffix = "\n\n[truncated]";
    let budget = limit.saturating_sub(suffix.chars().count());
    let head: String = text.chars().take(budget).collect();
    let cut = head.rfind('\n').unwrap_or(0);
    format!("{}{suffix}", &head[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> TelegramConfig {
        TelegramConfig {
            bot_token: "123:ABC".to_string(),
            chat_id: "456".to_string(),
            api_base: server.uri(),
            ..Default::default()
        }
    }

    #[test]
    fn test_telegram_config_default() {
        let config = TelegramConfig::default();
        assert!(config.bot_token.is_empty());
        assert!(config.chat_id.is_empty());
        assert_eq!(config.parse_mode, "Markdown");
        assert_eq!(config.api_base, TELEGRAM_API_BASE);
    }

    #[test]
    fn test_from_parts_requires_both() {
        assert!(TelegramConfig::from_parts(Some("tok"), None).is_none());
        assert!(TelegramConfig::from_parts(None, Some("1")).is_none());
        assert!(TelegramConfig::from_parts(Some(" "), Some("1")).is_none());
        let config = TelegramConfig::from_parts(Some(" tok "), Some("1")).unwrap();
        assert_eq!(config.bot_token, "tok");
    }

    #[test]
    fn test_telegram_channel_disabled() {
        let channel = TelegramChannel::new(TelegramConfig::default());
        assert!(!channel.is_enabled());
    }

    #[tokio::test]
    async fn test_send_posts_markdown_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:ABC/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": "456",
                "parse_mode": "Markdown"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let channel = TelegramChannel::new(config_for(&server));
        channel.test().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_reports_failure_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .expect(1)
            .mount(&server)
            .await;

        let channel = TelegramChannel::new(config_for(&server));
        let err = channel.test().await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn test_truncate_message() {
        let short = "hello";
        assert_eq!(truncate_message(short, 100), "hello");

        let long: String = "a".repeat(5000);
        let truncated = truncate_message(&long, TELEGRAM_MESSAGE_LIMIT);
        assert!(truncated.chars().count() <= TELEGRAM_MESSAGE_LIMIT);
        assert!(truncated.ends_with("[truncated]"));
    }

    #[test]
    fn test_truncate_message_keeps_entities_whole() {
        let text: String = (0..300)
            .map(|i| format!("🌍 *zone_{i:03}.example* 👤 `acct`\n"))
            .collect();
        let truncated = truncate_message(&text, TELEGRAM_MESSAGE_LIMIT);

        assert!(truncated.chars().count() <= TELEGRAM_MESSAGE_LIMIT);
        assert_eq!(truncated.matches('*').count() % 2, 0);
        assert_eq!(truncated.matches('`').count() % 2, 0);
        assert!(truncated.ends_with("`acct`\n\n[truncated]"));
    }
}
