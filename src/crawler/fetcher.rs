//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the shared HTTP client from configuration
//! - GET requests for section landing pages and result pages
//! - Classifying failures into transport and status errors
//! - Fetching one result page and storing the records it yields

use crate::config::HttpConfig;
use crate::crawler::parser::RecordExtractor;
use crate::output::RecordStore;
use crate::state::PageUnit;
use crate::url::page_url;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A failed request for one page
///
/// Both variants are recorded into a failure set and retried; neither is
/// fatal to the run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, timeout, DNS failure, or a broken body stream
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// Returns true if the request timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }

    /// HTTP status code, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// The client is shared by every section and page task; its connection pool
/// stands in for a per-section session.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true);

    if !config.trust_env_proxy {
        builder = builder.no_proxy();
    }

    builder.build()
}

/// Fetches a URL and returns its body
///
/// Any non-2xx status is an error; the body of a failed response is
/// discarded.
pub async fn fetch_body(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })
}

/// Fetches result pages and appends their records to the shared store
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    page_param: Arc<str>,
    extractor: Arc<dyn RecordExtractor>,
    store: RecordStore,
}

impl PageFetcher {
    pub fn new(
        client: Client,
        page_param: &str,
        extractor: Arc<dyn RecordExtractor>,
        store: RecordStore,
    ) -> Self {
        Self {
            client,
            page_param: Arc::from(page_param),
            extractor,
            store,
        }
    }

    /// Fetches one page and stores every record extracted from it
    ///
    /// Nothing is stored when the request fails. A page without product
    /// cards is a success with zero records.
    ///
    /// # Returns
    ///
    /// The number of records appended to the store
    pub async fn fetch_page(&self, unit: &PageUnit) -> Result<usize, FetchError> {
        let url = page_url(unit.section.url(), &self.page_param, unit.page);
        let body = fetch_body(&self.client, url.as_str()).await?;

        let records = self.extractor.extract(&body);
        Ok(self.store.append(records))
    }
}
