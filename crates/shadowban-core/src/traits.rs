use std::time::Duration;

use async_trait::async_trait;

use crate::{AccountHandle, DeliveryError, FetchError, StoreError, TenantId};

/// Retrieves a status page. Implementations must give up after `timeout`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
    fn name(&self) -> &str;
}

/// Delivers a text message to a tenant.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, tenant: TenantId, text: &str) -> Result<(), DeliveryError>;
}

/// Durable per-tenant watchlists and auto-scan settings.
///
/// Raw handles are normalized by the store; the normalized handle is
/// returned so callers can echo what was actually stored.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn add_account(&self, tenant: TenantId, raw_handle: &str)
        -> Result<AccountHandle, StoreError>;

    async fn remove_account(
        &self,
        tenant: TenantId,
        raw_handle: &str,
    ) -> Result<AccountHandle, StoreError>;

    /// Sorted by normalized handle.
    async fn list_accounts(&self, tenant: TenantId) -> Result<Vec<AccountHandle>, StoreError>;

    async fn set_auto_scan(&self, tenant: TenantId, enabled: bool) -> Result<(), StoreError>;

    /// `false` for tenants that never toggled the setting.
    async fn get_auto_scan(&self, tenant: TenantId) -> Result<bool, StoreError>;

    /// Flips the flag and returns the new value.
    async fn toggle_auto_scan(&self, tenant: TenantId) -> Result<bool, StoreError>;

    async fn list_auto_scan_tenants(&self) -> Result<Vec<TenantId>, StoreError>;
}
