mod telegram;
#[cfg(test)]
mod test_support;

pub use telegram::{Chat, Message, TelegramClient, Update, User};

use std::time::Duration;

/// Configuration for the Telegram delivery channel.
#[derive(Clone)]
pub struct NotificationConfig {
    pub bot_token: String,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl NotificationConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: telegram::DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(20),
        }
    }
}

impl std::fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("bot_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
