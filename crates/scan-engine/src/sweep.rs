use std::sync::Arc;
use std::time::Duration;

use shadowban_core::{
    AccountHandle, Notifier, ScanOutcome, StoreError, TenantId, WatchlistStore, SWEEP_HEADER,
};

use crate::scanner::AccountScanner;

/// Pause after each account's result, before the next fetch.
pub const SWEEP_PACING: Duration = Duration::from_secs(2);

pub type SweepEntry = (AccountHandle, ScanOutcome);

/// One pass over a tenant's watchlist.
///
/// Accounts are scanned one at a time in list order and each result is sent
/// as soon as it is known. Nothing that goes wrong with a single account
/// (fetch failure, missing account, undeliverable message) stops the pass.
pub struct TenantSweep {
    store: Arc<dyn WatchlistStore>,
    scanner: Arc<AccountScanner>,
    notifier: Arc<dyn Notifier>,
    pacing: Duration,
}

impl TenantSweep {
    pub fn new(
        store: Arc<dyn WatchlistStore>,
        scanner: Arc<AccountScanner>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            scanner,
            notifier,
            pacing: SWEEP_PACING,
        }
    }

    /// Only fails when the account list itself cannot be read, in which case
    /// nothing has been sent.
    pub async fn sweep(&self, tenant: TenantId) -> Result<Vec<SweepEntry>, StoreError> {
        let accounts = self.store.list_accounts(tenant).await?;
        if accounts.is_empty() {
            tracing::debug!("Chat {} has no watched accounts, skipping", tenant);
            return Ok(Vec::new());
        }

        tracing::info!("Sweeping {} accounts for chat {}", accounts.len(), tenant);
        self.deliver(tenant, SWEEP_HEADER).await;

        let mut entries = Vec::with_capacity(accounts.len());
        for handle in accounts {
            let report = self.scanner.scan_handle(&handle).await;
            self.deliver(tenant, &report.render()).await;
            entries.push((handle, report.outcome));

            tokio::time::sleep(self.pacing).await;
        }

        let failed = entries.iter().filter(|(_, o)| o.is_failure()).count();
        tracing::info!(
            "Sweep for chat {} done: {} scanned, {} fetch failures",
            tenant,
            entries.len(),
            failed
        );
        Ok(entries)
    }

    async fn deliver(&self, tenant: TenantId, text: &str) {
        if let Err(e) = self.notifier.notify(tenant, text).await {
            tracing::warn!("Failed to deliver to chat {}: {}", tenant, e);
        }
    }
}
