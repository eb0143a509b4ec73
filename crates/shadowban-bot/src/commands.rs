//! Chat command parsing and handling.

use std::sync::Arc;

use scan_engine::AccountScanner;
use shadowban_core::{AccountHandle, Notifier, StoreError, TenantId, WatchlistStore};

const STORE_UNAVAILABLE: &str = "⚠️ Storage is unavailable right now, please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Add(String),
    Remove(String),
    List,
    Check(String),
    AutoCheck,
    /// A known command missing its `<username>` argument.
    Usage(&'static str),
}

impl BotCommand {
    /// Parse a chat message. Returns `None` for anything that is not one of
    /// our commands. Accepts the `/cmd@BotName` form used in group chats.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.strip_prefix('/')?;
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();

        let arg = parts
            .next()
            .filter(|raw| !AccountHandle::normalize(raw).is_empty())
            .map(str::to_string);

        let command = match name.as_str() {
            "start" | "help" => BotCommand::Start,
            "list" => BotCommand::List,
            "autocheck" => BotCommand::AutoCheck,
            "add" => arg.map_or(BotCommand::Usage("add"), BotCommand::Add),
            "remove" => arg.map_or(BotCommand::Usage("remove"), BotCommand::Remove),
            "check" => arg.map_or(BotCommand::Usage("check"), BotCommand::Check),
            _ => return None,
        };
        Some(command)
    }

    /// Commands that wait on the status site.
    pub fn is_slow(&self) -> bool {
        matches!(self, BotCommand::Check(_))
    }
}

/// Executes commands on behalf of a chat and sends the replies.
pub struct CommandHandler {
    store: Arc<dyn WatchlistStore>,
    scanner: Arc<AccountScanner>,
    notifier: Arc<dyn Notifier>,
    schedule_label: String,
}

impl CommandHandler {
    pub fn new(
        store: Arc<dyn WatchlistStore>,
        scanner: Arc<AccountScanner>,
        notifier: Arc<dyn Notifier>,
        schedule_label: String,
    ) -> Self {
        Self {
            store,
            scanner,
            notifier,
            schedule_label,
        }
    }

    pub async fn handle(&self, tenant: TenantId, command: BotCommand) {
        tracing::debug!("Chat {} issued {:?}", tenant, command);

        match command {
            BotCommand::Start => self.reply(tenant, &self.help_text()).await,
            BotCommand::Usage(name) => {
                self.reply(tenant, &format!("Usage: /{name} <username>")).await
            }
            BotCommand::Add(raw) => {
                let reply = match self.store.add_account(tenant, &raw).await {
                    Ok(handle) => format!("✅ @{handle} added to the watchlist."),
                    Err(e) => self.store_failure(tenant, e, "add"),
                };
                self.reply(tenant, &reply).await
            }
            BotCommand::Remove(raw) => {
                let reply = match self.store.remove_account(tenant, &raw).await {
                    Ok(handle) => format!("❌ @{handle} removed from the watchlist."),
                    Err(e) => self.store_failure(tenant, e, "remove"),
                };
                self.reply(tenant, &reply).await
            }
            BotCommand::List => {
                let reply = match self.store.list_accounts(tenant).await {
                    Ok(accounts) if accounts.is_empty() => "No accounts watched.".to_string(),
                    Ok(accounts) => {
                        let lines: Vec<String> =
                            accounts.iter().map(|h| format!("• @{h}")).collect();
                        format!("Watched accounts:\n{}", lines.join("\n"))
                    }
                    Err(e) => self.store_failure(tenant, e, "list"),
                };
                self.reply(tenant, &reply).await
            }
            BotCommand::Check(raw) => {
                let handle = AccountHandle::normalize(&raw);
                self.reply(tenant, &format!("⏳ Checking @{handle}...")).await;
                let report = self.scanner.scan_handle(&handle).await;
                self.reply(tenant, &report.render()).await
            }
            BotCommand::AutoCheck => {
                let reply = match self.store.toggle_auto_scan(tenant).await {
                    Ok(true) => format!(
                        "✅ Automatic checks enabled ({}).",
                        self.schedule_label
                    ),
                    Ok(false) => "❌ Automatic checks disabled.".to_string(),
                    Err(e) => self.store_failure(tenant, e, "autocheck"),
                };
                self.reply(tenant, &reply).await
            }
        }
    }

    fn help_text(&self) -> String {
        format!(
            "Shadowban watch bot.\n\n\
             Commands:\n\
             /add <username> – watch an account\n\
             /remove <username> – stop watching an account\n\
             /list – list watched accounts\n\
             /check <username> – check an account now\n\
             /autocheck – turn automatic checks on or off ({})",
            self.schedule_label
        )
    }

    fn store_failure(&self, tenant: TenantId, err: StoreError, command: &str) -> String {
        match err {
            StoreError::InvalidHandle(_) => format!("Usage: /{command} <username>"),
            StoreError::Database(_) => {
                tracing::error!("/{} failed for chat {}: {}", command, tenant, err);
                STORE_UNAVAILABLE.to_string()
            }
        }
    }

    async fn reply(&self, tenant: TenantId, text: &str) {
        if let Err(e) = self.notifier.notify(tenant, text).await {
            tracing::warn!("Failed to reply to chat {}: {}", tenant, e);
        }
    }
}
