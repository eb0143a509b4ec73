use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shadowban_core::{FetchError, PageFetcher};

use crate::map_reqwest_error;

const USER_AGENT: &str = concat!("shadowban-watch/", env!("CARGO_PKG_VERSION"));

/// Plain GET fetcher.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// `accept_invalid_certs` skips TLS verification; the status site has
    /// been seen serving a certificate that does not verify.
    pub fn new(accept_invalid_certs: bool) -> Result<Self, FetchError> {
        if accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for page fetches");
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("GET {} returned {}", url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(map_reqwest_error)
    }

    fn name(&self) -> &str {
        "http"
    }
}
