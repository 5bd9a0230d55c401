use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::config::FetchConfig;

/// Headers sent with every page fetch, next to the browser User-Agent.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Upgrade-Insecure-Requests", "1"),
];

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("HTTP status {status} for url ({url})")]
    Status { status: u16, url: String },
}

impl FetchError {
    /// The error text followed by every underlying cause, e.g.
    /// `error sending request for url (...): tcp connect error: Connection refused`.
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }
}

/// Where listing pages come from. The HTTP implementation is the only one
/// used by the server; tests plug in canned pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Raw HTML for `url`. Any non-2xx status is an error.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpPageFetcher {
    client: Client,
    user_agent: String,
    timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let timeout = config.resolve_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            user_agent: config.resolve_user_agent(),
            timeout,
        })
    }
}

#[async_trait]
impl PageSource for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        info!("Fetching listing page from {} (timeout {:?})", host, self.timeout);

        let mut request_builder = self
            .client
            .get(url)
            .header("User-Agent", self.user_agent.as_str());
        for (name, value) in BROWSER_HEADERS {
            request_builder = request_builder.header(*name, *value);
        }

        let response = request_builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Listing page fetch from {} returned {}", host, status);
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await?;
        info!("Fetched {} bytes from {}", html.len(), host);
        Ok(html)
    }
}
