//! Thin Telegram Bot API client: `sendMessage` for delivery and
//! `getUpdates` long polling for the command front end.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shadowban_core::{DeliveryError, Notifier, TenantId};

use crate::NotificationConfig;

pub(crate) const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram rejects longer messages.
const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, DeliveryError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(DeliveryError::Api("response carried no result".into())),
            (false, _) => Err(DeliveryError::Api(format!(
                "{} ({})",
                self.description.unwrap_or_else(|| "unknown error".into()),
                self.error_code.unwrap_or_default()
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

pub struct TelegramClient {
    client: Client,
    bot_url: String,
    request_timeout: Duration,
}

impl TelegramClient {
    pub fn new(config: &NotificationConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            bot_url: format!(
                "{}/bot{}",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            request_timeout: config.request_timeout,
        })
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": truncate(text),
            "disable_web_page_preview": true,
        });

        let resp: ApiResponse<Message> = self
            .call("sendMessage", &payload, self.request_timeout)
            .await?;
        resp.into_result()?;

        tracing::debug!("Telegram message sent to chat {}", chat_id);
        Ok(())
    }

    /// Long-poll for new updates. `offset` is one past the last update seen.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, DeliveryError> {
        let mut payload = serde_json::json!({
            "timeout": poll_timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            payload["offset"] = serde_json::json!(offset);
        }

        // The HTTP request has to outlive the server-side long poll.
        let resp: ApiResponse<Vec<Update>> = self
            .call("getUpdates", &payload, poll_timeout + self.request_timeout)
            .await?;
        resp.into_result()
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        payload: &serde_json::Value,
        timeout: Duration,
    ) -> Result<ApiResponse<T>, DeliveryError> {
        let resp = self
            .client
            .post(format!("{}/{}", self.bot_url, method))
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;

        // Telegram reports API failures as JSON bodies on non-2xx statuses too.
        resp.json::<ApiResponse<T>>()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn notify(&self, tenant: TenantId, text: &str) -> Result<(), DeliveryError> {
        self.send_message(tenant.0, text).await
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;

    fn client_for(api_base: String) -> TelegramClient {
        let mut config = NotificationConfig::new("123:abc");
        config.api_base = api_base;
        TelegramClient::new(&config).unwrap()
    }

    #[test]
    fn test_parse_updates() {
        let json = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"message_id": 1, "chat": {"id": -1001}, "from": {"id": 5, "username": "op"}, "text": "/add @Foo"}},
                {"update_id": 11, "edited_message": {"message_id": 1, "chat": {"id": -1001}}},
                {"update_id": 12, "message": {"message_id": 2, "chat": {"id": 77}}}
            ]
        }"#;
        let resp: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        let updates = resp.into_result().unwrap();

        assert_eq!(updates.len(), 3);
        let first = updates[0].message.as_ref().unwrap();
        assert_eq!(first.chat.id, -1001);
        assert_eq!(first.text.as_deref(), Some("/add @Foo"));
        assert!(updates[1].message.is_none());
        assert!(updates[2].message.as_ref().unwrap().text.is_none());
    }

    #[test]
    fn test_api_error_is_reported() {
        let json = r#"{"ok": false, "error_code": 403, "description": "Forbidden: bot was blocked by the user"}"#;
        let resp: ApiResponse<Message> = serde_json::from_str(json).unwrap();
        let err = resp.into_result().unwrap_err();
        assert!(err.to_string().contains("bot was blocked"));
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "é".repeat(MAX_MESSAGE_CHARS + 10);
        assert_eq!(truncate(&long).chars().count(), MAX_MESSAGE_CHARS);
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = NotificationConfig::new("123:very-secret");
        assert!(!format!("{config:?}").contains("very-secret"));
    }

    #[tokio::test]
    async fn test_send_message_ok() {
        let base = serve_once(
            "200 OK",
            "application/json",
            r#"{"ok":true,"result":{"message_id":9,"chat":{"id":42},"text":"hi"}}"#,
        )
        .await;
        client_for(base).notify(TenantId(42), "hi").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_message_rejected() {
        let base = serve_once(
            "400 Bad Request",
            "application/json",
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        )
        .await;
        let err = client_for(base)
            .notify(TenantId(1), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Api(_)));
    }
}
