use crate::core::{ConfigProvider, Fetcher};
use crate::utils::error::{MapError, Result};
use reqwest::Client;
use std::time::Duration;

/// Plain GET against the published sheet. No retries: a failed fetch is
/// reported and the next scheduled cycle tries again.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    url: String,
    timeout: Option<Duration>,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            timeout: None,
        }
    }

    /// Without a timeout the transport's own defaults apply.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(config.source_url()).with_timeout(config.request_timeout())
    }
}

impl Fetcher for HttpFetcher {
    fn source(&self) -> &str {
        &self.url
    }

    async fn fetch_text(&self) -> Result<String> {
        tracing::debug!("Making sheet request to: {}", self.url);

        let mut request = self.client.get(&self.url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Sheet response status: {}", status);

        if !status.is_success() {
            return Err(MapError::ContentError {
                url: self.url.clone(),
                message: format!("HTTP {}", status),
            });
        }

        let text = response.text().await.map_err(|e| MapError::ContentError {
            url: self.url.clone(),
            message: format!("unreadable body: {}", e),
        })?;

        tracing::debug!("Received {} bytes of sheet text", text.len());
        Ok(text)
    }
}
