//! In-memory stand-ins for the engine's collaborators.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shadowban_core::{
    AccountHandle, DeliveryError, FetchError, Notifier, PageFetcher, StoreError, TenantId,
    WatchlistStore,
};
use tokio::time::Instant;

enum Behavior {
    Page(String),
    Fail(FetchError),
    Hang,
}

pub struct FakeFetcher {
    behaviors: HashMap<String, Behavior>,
    requested: Arc<Mutex<Vec<String>>>,
    started: Arc<Mutex<Vec<Instant>>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            requested: Arc::new(Mutex::new(Vec::new())),
            started: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn page(mut self, handle: &str, content: &str) -> Self {
        self.behaviors
            .insert(handle.to_string(), Behavior::Page(content.to_string()));
        self
    }

    pub fn fail(mut self, handle: &str, err: FetchError) -> Self {
        self.behaviors.insert(handle.to_string(), Behavior::Fail(err));
        self
    }

    pub fn hang(mut self, handle: &str) -> Self {
        self.behaviors.insert(handle.to_string(), Behavior::Hang);
        self
    }

    pub fn requested(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requested)
    }

    pub fn started(&self) -> Arc<Mutex<Vec<Instant>>> {
        Arc::clone(&self.started)
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch_page(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.started.lock().unwrap().push(Instant::now());

        let handle = url.rsplit("username=").next().unwrap_or_default();
        match self.behaviors.get(handle) {
            Some(Behavior::Page(content)) => Ok(content.clone()),
            Some(Behavior::Fail(err)) => Err(err.clone()),
            Some(Behavior::Hang) => std::future::pending().await,
            None => Err(FetchError::Status(404)),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    sent: Mutex<Vec<(TenantId, String)>>,
    failing: HashSet<TenantId>,
}

impl FakeNotifier {
    pub fn failing_for(tenant: TenantId) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: HashSet::from([tenant]),
        }
    }

    pub fn sent(&self) -> Vec<(TenantId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, tenant: TenantId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(t, _)| *t == tenant)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, tenant: TenantId, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((tenant, text.to_string()));
        if self.failing.contains(&tenant) {
            return Err(DeliveryError::Api("Forbidden: bot was kicked".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeStore {
    accounts: Mutex<BTreeMap<TenantId, BTreeSet<AccountHandle>>>,
    auto: Mutex<BTreeMap<TenantId, bool>>,
    broken: HashSet<TenantId>,
    broken_tenant_listing: bool,
}

impl FakeStore {
    pub fn with_accounts(self, tenant: TenantId, handles: &[&str]) -> Self {
        {
            let mut accounts = self.accounts.lock().unwrap();
            let set = accounts.entry(tenant).or_default();
            for raw in handles {
                set.insert(AccountHandle::normalize(raw));
            }
        }
        self
    }

    pub fn with_auto(self, tenant: TenantId) -> Self {
        self.auto.lock().unwrap().insert(tenant, true);
        self
    }

    pub fn broken_for(mut self, tenant: TenantId) -> Self {
        self.broken.insert(tenant);
        self
    }

    pub fn broken_tenant_listing(mut self) -> Self {
        self.broken_tenant_listing = true;
        self
    }

    fn check(&self, tenant: TenantId) -> Result<(), StoreError> {
        if self.broken.contains(&tenant) {
            return Err(StoreError::Database("database is locked".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl WatchlistStore for FakeStore {
    async fn add_account(&self, tenant: TenantId, raw: &str) -> Result<AccountHandle, StoreError> {
        self.check(tenant)?;
        let handle = AccountHandle::normalize(raw);
        self.accounts
            .lock()
            .unwrap()
            .entry(tenant)
            .or_default()
            .insert(handle.clone());
        Ok(handle)
    }

    async fn remove_account(
        &self,
        tenant: TenantId,
        raw: &str,
    ) -> Result<AccountHandle, StoreError> {
        self.check(tenant)?;
        let handle = AccountHandle::normalize(raw);
        if let Some(set) = self.accounts.lock().unwrap().get_mut(&tenant) {
            set.remove(&handle);
        }
        Ok(handle)
    }

    async fn list_accounts(&self, tenant: TenantId) -> Result<Vec<AccountHandle>, StoreError> {
        self.check(tenant)?;
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(&tenant)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn set_auto_scan(&self, tenant: TenantId, enabled: bool) -> Result<(), StoreError> {
        self.check(tenant)?;
        self.auto.lock().unwrap().insert(tenant, enabled);
        Ok(())
    }

    async fn get_auto_scan(&self, tenant: TenantId) -> Result<bool, StoreError> {
        self.check(tenant)?;
        Ok(self.auto.lock().unwrap().get(&tenant).copied().unwrap_or(false))
    }

    async fn toggle_auto_scan(&self, tenant: TenantId) -> Result<bool, StoreError> {
        self.check(tenant)?;
        let mut auto = self.auto.lock().unwrap();
        let flag = auto.entry(tenant).or_insert(false);
        *flag = !*flag;
        Ok(*flag)
    }

    async fn list_auto_scan_tenants(&self) -> Result<Vec<TenantId>, StoreError> {
        if self.broken_tenant_listing {
            return Err(StoreError::Database("unable to open database file".into()));
        }
        Ok(self
            .auto
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(tenant, _)| *tenant)
            .collect())
    }
}
