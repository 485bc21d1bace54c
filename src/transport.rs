//! HTTP transport abstraction for source adapters

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

use crate::errors::MandiError;

const REQUEST_TIMEOUT_SECS: u64 = 10;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Abstraction over outbound HTTP GETs
///
/// Source adapters fetch through this trait so tests can substitute canned
/// responses and count calls without touching the network.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fetch a URL and return the response body as text
    async fn get(&self, url: &str) -> Result<String, MandiError>;
}

/// reqwest-backed transport with a browser User-Agent and a bounded timeout
///
/// The timeout is the stall bound for the whole aggregation chain: a hung
/// upstream surfaces as an adapter error and the chain moves on.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<String, MandiError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(MandiError::ApiError(format!(
                "request to {} failed: {}",
                url,
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}
