//! Page-fetch backends behind [`shadowban_core::PageFetcher`].
//!
//! Both backends return the page body as text; the scan engine does not know
//! which one it is talking to.

mod browserless;
mod http;
#[cfg(test)]
mod test_support;

pub use browserless::BrowserlessFetcher;
pub use http::HttpFetcher;

use std::str::FromStr;
use std::sync::Arc;

use shadowban_core::{FetchError, PageFetcher};

/// Which backend serves page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchBackend {
    /// Plain HTTP GET.
    #[default]
    Http,
    /// Rendered fetch through a Browserless `/content` endpoint.
    Browserless,
}

impl FromStr for FetchBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "" => Ok(FetchBackend::Http),
            "browserless" | "browser" => Ok(FetchBackend::Browserless),
            other => Err(format!("unknown fetch backend {other:?} (expected http or browserless)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub backend: FetchBackend,
    pub accept_invalid_certs: bool,
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
}

/// Build the configured backend.
pub fn build_fetcher(config: &FetcherConfig) -> Result<Arc<dyn PageFetcher>, FetchError> {
    match config.backend {
        FetchBackend::Http => Ok(Arc::new(HttpFetcher::new(config.accept_invalid_certs)?)),
        FetchBackend::Browserless => {
            let base_url = config.browserless_url.as_deref().ok_or_else(|| {
                FetchError::Transport("BROWSERLESS_URL is required for the browserless backend".into())
            })?;
            Ok(Arc::new(BrowserlessFetcher::new(
                base_url,
                config.browserless_token.as_deref(),
            )?))
        }
    }
}

/// The request URL is stripped: it can carry the Browserless token, and the
/// error text ends up in chat messages.
pub(crate) fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.without_url().to_string())
    }
}
