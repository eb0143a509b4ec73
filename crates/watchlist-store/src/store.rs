use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use shadowban_core::{AccountHandle, StoreError, TenantId, WatchlistStore};
use tokio::sync::Mutex;

use crate::db::{db_err, WatchlistDb};

/// SQLite-backed watchlist store.
///
/// Each statement commits before the call returns. Mutations for one tenant
/// are serialized through a per-tenant lock; reads and other tenants' writes
/// never wait on it. A lock lives in the map only while someone holds or
/// waits on it.
pub struct SqliteWatchlistStore {
    db: WatchlistDb,
    tenant_locks: DashMap<TenantId, Arc<Mutex<()>>>,
}

impl SqliteWatchlistStore {
    pub fn new(db: WatchlistDb) -> Self {
        Self {
            db,
            tenant_locks: DashMap::new(),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(WatchlistDb::new(database_url).await?))
    }

    /// Run `op` while holding `tenant`'s lock, then drop the lock from the map
    /// if nobody else is waiting on it.
    async fn with_tenant_lock<T>(&self, tenant: TenantId, op: impl Future<Output = T>) -> T {
        // Clone out of the map so no shard guard is held across an await.
        let lock = self.tenant_locks.entry(tenant).or_default().clone();
        let out = {
            let _guard = lock.lock().await;
            op.await
        };
        drop(lock);

        self.tenant_locks
            .remove_if(&tenant, |_, lock| Arc::strong_count(lock) == 1);
        out
    }

    fn normalize(raw_handle: &str) -> Result<AccountHandle, StoreError> {
        let handle = AccountHandle::normalize(raw_handle);
        if handle.is_empty() {
            return Err(StoreError::InvalidHandle(raw_handle.to_string()));
        }
        Ok(handle)
    }
}

#[async_trait]
impl WatchlistStore for SqliteWatchlistStore {
    async fn add_account(
        &self,
        tenant: TenantId,
        raw_handle: &str,
    ) -> Result<AccountHandle, StoreError> {
        let handle = Self::normalize(raw_handle)?;
        let insert = sqlx::query("INSERT OR IGNORE INTO accounts (chat_id, username) VALUES (?, ?)")
            .bind(tenant.0)
            .bind(handle.as_str())
            .execute(self.db.pool());
        let result = self.with_tenant_lock(tenant, insert).await.map_err(db_err)?;

        if result.rows_affected() == 0 {
            tracing::debug!("@{} already watched by chat {}", handle, tenant);
        } else {
            tracing::info!("Chat {} now watching @{}", tenant, handle);
        }
        Ok(handle)
    }

    async fn remove_account(
        &self,
        tenant: TenantId,
        raw_handle: &str,
    ) -> Result<AccountHandle, StoreError> {
        let handle = Self::normalize(raw_handle)?;
        let delete = sqlx::query("DELETE FROM accounts WHERE chat_id = ? AND username = ?")
            .bind(tenant.0)
            .bind(handle.as_str())
            .execute(self.db.pool());
        let result = self.with_tenant_lock(tenant, delete).await.map_err(db_err)?;

        if result.rows_affected() > 0 {
            tracing::info!("Chat {} stopped watching @{}", tenant, handle);
        }
        Ok(handle)
    }

    async fn list_accounts(&self, tenant: TenantId) -> Result<Vec<AccountHandle>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT username FROM accounts WHERE chat_id = ? ORDER BY username")
                .bind(tenant.0)
                .fetch_all(self.db.pool())
                .await
                .map_err(db_err)?;

        // Stored values are already normalized.
        Ok(rows
            .into_iter()
            .map(|(username,)| AccountHandle::normalize(&username))
            .collect())
    }

    async fn set_auto_scan(&self, tenant: TenantId, enabled: bool) -> Result<(), StoreError> {
        let upsert = sqlx::query(
            "INSERT INTO chat_settings (chat_id, auto_check_enabled) VALUES (?, ?)
             ON CONFLICT(chat_id) DO UPDATE SET auto_check_enabled = excluded.auto_check_enabled",
        )
        .bind(tenant.0)
        .bind(i64::from(enabled))
        .execute(self.db.pool());
        self.with_tenant_lock(tenant, upsert).await.map_err(db_err)?;

        tracing::info!("Auto-scan for chat {} set to {}", tenant, enabled);
        Ok(())
    }

    async fn get_auto_scan(&self, tenant: TenantId) -> Result<bool, StoreError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT auto_check_enabled FROM chat_settings WHERE chat_id = ?")
                .bind(tenant.0)
                .fetch_optional(self.db.pool())
                .await
                .map_err(db_err)?;

        Ok(row.map(|(flag,)| flag != 0).unwrap_or(false))
    }

    async fn toggle_auto_scan(&self, tenant: TenantId) -> Result<bool, StoreError> {
        let toggle = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO chat_settings (chat_id, auto_check_enabled) VALUES (?, 1)
             ON CONFLICT(chat_id) DO UPDATE SET auto_check_enabled = 1 - chat_settings.auto_check_enabled
             RETURNING auto_check_enabled",
        )
        .bind(tenant.0)
        .fetch_one(self.db.pool());
        let (flag,): (i64,) = self.with_tenant_lock(tenant, toggle).await.map_err(db_err)?;

        let enabled = flag != 0;
        tracing::info!("Auto-scan for chat {} toggled to {}", tenant, enabled);
        Ok(enabled)
    }

    async fn list_auto_scan_tenants(&self) -> Result<Vec<TenantId>, StoreError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT chat_id FROM chat_settings WHERE auto_check_enabled = 1 ORDER BY chat_id",
        )
        .fetch_all(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|(chat_id,)| TenantId(chat_id)).collect())
    }
}
