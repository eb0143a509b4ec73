//! Telegram long-polling loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use notification_service::{TelegramClient, Update};
use shadowban_core::TenantId;

use crate::commands::{BotCommand, CommandHandler};

pub const POLL_TIMEOUT: Duration = Duration::from_secs(30);
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Extract the chat and command from an update, if it carries one.
pub fn command_of(update: &Update) -> Option<(TenantId, BotCommand)> {
    let message = update.message.as_ref()?;
    let command = BotCommand::parse(message.text.as_deref()?)?;
    Some((TenantId(message.chat.id), command))
}

/// Offset acknowledging every update in `updates`.
pub fn next_offset(current: Option<i64>, updates: &[Update]) -> Option<i64> {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .max(current)
}

pub struct Poller {
    client: Arc<TelegramClient>,
    handler: Arc<CommandHandler>,
}

impl Poller {
    pub fn new(client: Arc<TelegramClient>, handler: Arc<CommandHandler>) -> Self {
        Self { client, handler }
    }

    /// Poll until `shutdown` resolves. Store commands run inline so a chat's
    /// mutations apply in the order they were sent; `/check` is spawned so a
    /// slow site never stalls polling.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut offset: Option<i64> = None;

        tracing::info!("Polling Telegram for updates");
        loop {
            let updates = tokio::select! {
                res = self.client.get_updates(offset, POLL_TIMEOUT) => res,
                _ = &mut shutdown => break,
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!("getUpdates failed: {}, retrying in {:?}", e, ERROR_BACKOFF);
                    tokio::select! {
                        _ = tokio::time::sleep(ERROR_BACKOFF) => continue,
                        _ = &mut shutdown => break,
                    }
                }
            };

            offset = next_offset(offset, &updates);
            for (tenant, command) in updates.iter().filter_map(command_of) {
                if command.is_slow() {
                    let handler = Arc::clone(&self.handler);
                    tokio::spawn(async move { handler.handle(tenant, command).await });
                } else {
                    self.handler.handle(tenant, command).await;
                }
            }
        }

        tracing::info!("Telegram polling stopped");
    }
}
