use std::time::Duration;

use tracing::info;

use crate::config::Settings;
use crate::error::{Error, Result};

/// Network reads the pipeline needs: the daily page and binary assets.
pub trait PageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String>;
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
    page_timeout: Duration,
    asset_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Self {
        HttpFetcher {
            client: reqwest::Client::new(),
            user_agent: settings.user_agent.clone(),
            page_timeout: settings.fetch_timeout(),
            asset_timeout: settings.asset_timeout(),
        }
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Error::http(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        info!("Fetching daily view: {}", url);
        self.get(url, self.page_timeout)
            .await?
            .text()
            .await
            .map_err(|e| Error::http(url, e))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .get(url, self.asset_timeout)
            .await?
            .bytes()
            .await
            .map_err(|e| Error::http(url, e))?;
        Ok(bytes.to_vec())
    }
}
