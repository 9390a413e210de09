use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::errors::FetchError;
use crate::pipeline::decode_payload;
use crate::providers::TextFetcher;

/// HTTP caption fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// HTTP client for making requests
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with a request timeout and user agent
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(user_agent.into())
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a fetcher from the fetch section of the configuration
    pub fn from_config(config: &crate::app_config::FetchConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs), config.user_agent.clone())
    }
}

#[async_trait]
impl TextFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!("unsupported scheme in {}", url)));
        }

        debug!("Fetching captions from {}", parsed);
        let response = self.client.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Caption request failed ({}): {}", status, url);
            return Err(FetchError::HttpStatus {
                status_code: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(decode_payload(&bytes))
    }
}
