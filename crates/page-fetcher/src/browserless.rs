use std::time::Duration;

use async_trait::async_trait;
use shadowban_core::{FetchError, PageFetcher};

use crate::map_reqwest_error;

/// Fetches fully-rendered HTML through a Browserless `/content` endpoint,
/// for status pages that only fill in their verdicts client-side.
pub struct BrowserlessFetcher {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessFetcher {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    fn endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }
}

#[async_trait]
impl PageFetcher for BrowserlessFetcher {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let body = serde_json::json!({ "url": url });

        let resp = self
            .client
            .post(self.endpoint())
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!("Browserless returned {} for {}: {}", status, url, message);
            return Err(FetchError::Status(status.as_u16()));
        }

        resp.text().await.map_err(map_reqwest_error)
    }

    fn name(&self) -> &str {
        "browserless"
    }
}
