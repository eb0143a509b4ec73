use std::sync::Arc;
use std::time::Duration;

use shadowban_core::{
    classify, AccountHandle, FetchError, PageFetcher, ScanOutcome, ScanReport,
};

pub const DEFAULT_BASE_URL: &str = "https://hisubway.online/shadowban/";

/// Upper bound on a single page fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Fetches and classifies one account's status page.
///
/// Never fails: fetch problems come back as [`ScanOutcome::Failed`] inside
/// the report. One attempt per call, no retries.
pub struct AccountScanner {
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
    timeout: Duration,
}

impl AccountScanner {
    pub fn new(fetcher: Arc<dyn PageFetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            timeout: FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn target_url(&self, handle: &AccountHandle) -> String {
        format!(
            "{}?username={}",
            self.base_url,
            urlencoding::encode(handle.as_str())
        )
    }

    pub async fn scan(&self, raw_handle: &str) -> ScanReport {
        self.scan_handle(&AccountHandle::normalize(raw_handle)).await
    }

    pub async fn scan_handle(&self, handle: &AccountHandle) -> ScanReport {
        let url = self.target_url(handle);

        // Backends apply the timeout themselves; this bounds misbehaving ones.
        let fetched = match tokio::time::timeout(
            self.timeout,
            self.fetcher.fetch_page(&url, self.timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        };

        let outcome = match fetched {
            Ok(content) => {
                let result = classify(handle, &content);
                tracing::info!(
                    "Scanned @{} via {} (exists: {})",
                    handle,
                    self.fetcher.name(),
                    result.exists
                );
                ScanOutcome::Checked(result)
            }
            Err(e) => {
                tracing::warn!("Fetch failed for @{}: {}", handle, e);
                ScanOutcome::Failed(e)
            }
        };

        ScanReport {
            handle: handle.clone(),
            url,
            outcome,
        }
    }
}
