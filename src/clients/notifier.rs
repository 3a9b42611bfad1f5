// Alert delivery

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::config::TelegramConfig;

/// Button-style link attached to an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLink {
    pub label: String,
    pub url: String,
}

impl ActionLink {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, target: &str, message: &str, links: &[ActionLink]) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification transport error: {0}")]
    Transport(String),

    #[error("Notification rejected ({status}): {description}")]
    Rejected { status: u16, description: String },

    #[error("Notifier not configured: {0}")]
    NotConfigured(String),

    #[error("Notification timed out after {0}s")]
    Timeout(u64),
}

/// Telegram Bot API `sendMessage` with an inline keyboard for links.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
}

impl TelegramNotifier {
    pub fn new(api_url: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self, NotifyError> {
        if config.bot_token.is_empty() {
            return Err(NotifyError::NotConfigured(
                "telegram.bot_token is empty (set it in config.toml or TELEGRAM_BOT_TOKEN)".to_string(),
            ));
        }
        Ok(Self::new(config.api_url.clone(), config.bot_token.clone()))
    }

    pub fn build_payload(target: &str, message: &str, links: &[ActionLink]) -> Value {
        let mut payload = json!({
            "chat_id": target,
            "text": message,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        if !links.is_empty() {
            let row: Vec<Value> = links
                .iter()
                .map(|link| json!({ "text": link.label, "url": link.url }))
                .collect();
            payload["reply_markup"] = json!({ "inline_keyboard": [row] });
        }

        payload
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, target: &str, message: &str, links: &[ActionLink]) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);
        let payload = Self::build_payload(target, message, links);

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(());
        }

        let description = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body["description"].as_str().map(str::to_string))
            .unwrap_or_else(|| "no description".to_string());

        Err(NotifyError::Rejected { status, description })
    }
}

/// Writes alerts to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, target: &str, message: &str, links: &[ActionLink]) -> Result<(), NotifyError> {
        info!(target_chat = target, links = links.len(), "📣 [dry-run] alert\n{}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_with_links() {
        let links = vec![ActionLink::new("Chart", "https://example.com/chart")];
        let payload = TelegramNotifier::build_payload("42", "hello", &links);
        assert_eq!(payload["chat_id"], "42");
        assert_eq!(payload["parse_mode"], "HTML");
        assert_eq!(payload["reply_markup"]["inline_keyboard"][0][0]["text"], "Chart");
    }

    #[test]
    fn test_payload_without_links_has_no_keyboard() {
        let payload = TelegramNotifier::build_payload("42", "hello", &[]);
        assert!(payload.get("reply_markup").is_none());
    }

    #[test]
    fn test_from_config_requires_token() {
        let err = TelegramNotifier::from_config(&TelegramConfig::default()).unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        assert!(LogNotifier.send("chat", "msg", &[]).await.is_ok());
    }
}
