//! Section prober: discovers how many result pages a section has
//!
//! The landing page of a section carries a count indicator such as
//! `<span data-category-products-count>1 234 продукта</span>`. The prober
//! reads that count and divides it by the page size.

use crate::config::CatalogConfig;
use crate::crawler::fetcher::{fetch_body, FetchError};
use crate::state::SectionTarget;
use crate::ConfigError;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;

/// A section whose page count could not be determined
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("count indicator on {url} is unparseable: {text:?}")]
    UnparseableCount { url: String, text: String },
}

/// Locates and parses the total item count on a landing page
#[derive(Debug, Clone)]
pub struct CountIndicator {
    selector: Selector,
    pattern: Regex,
}

impl CountIndicator {
    /// Compiles the indicator selector and count pattern
    pub fn new(selector: &str, pattern: &str) -> Result<Self, ConfigError> {
        let selector = Selector::parse(selector).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid count selector '{}': {:?}", selector, e))
        })?;
        let pattern = Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid count pattern '{}': {}", pattern, e))
        })?;
        Ok(Self { selector, pattern })
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self, ConfigError> {
        Self::new(&config.count_selector, &config.count_pattern)
    }

    /// Reads the item count from a landing page body
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The page has no count indicator
    /// * `Ok(Some(n))` - The indicator declares `n` items
    /// * `Err(text)` - The indicator is present but its text carries no count
    pub fn item_count(&self, body: &str) -> Result<Option<u64>, String> {
        let document = Html::parse_document(body);

        let Some(element) = document.select(&self.selector).next() else {
            return Ok(None);
        };
        let text = element.text().map(str::trim).collect::<Vec<_>>().join(" ");
        let text = text.trim().to_string();

        self.parse_count(&text).map(Some).ok_or(text)
    }

    /// Extracts the count from indicator text, ignoring digit-group spaces
    fn parse_count(&self, text: &str) -> Option<u64> {
        let digits: String = self
            .pattern
            .captures(text)?
            .get(1)?
            .as_str()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        digits.parse().ok()
    }
}

/// Number of pages needed to show `item_count` items, `page_size` per page
pub fn page_count(item_count: u64, page_size: u32) -> u64 {
    item_count.div_ceil(u64::from(page_size.max(1)))
}

/// Fetches section landing pages and computes their page counts
#[derive(Debug, Clone)]
pub struct SectionProber {
    client: Client,
    indicator: CountIndicator,
    page_size: u32,
}

impl SectionProber {
    pub fn new(client: Client, indicator: CountIndicator, page_size: u32) -> Self {
        Self {
            client,
            indicator,
            page_size,
        }
    }

    /// Probes a section and returns the number of result pages to fetch
    ///
    /// A landing page without a count indicator has zero pages; this is not
    /// a failure.
    pub async fn probe(&self, section: &SectionTarget) -> Result<u32, ProbeError> {
        let body = fetch_body(&self.client, section.as_str()).await?;

        let item_count = match self.indicator.item_count(&body) {
            Ok(Some(count)) => count,
            Ok(None) => {
                tracing::info!("No item count on {}, treating as empty", section);
                return Ok(0);
            }
            Err(text) => {
                return Err(ProbeError::UnparseableCount {
                    url: section.to_string(),
                    text,
                })
            }
        };

        let pages = u32::try_from(page_count(item_count, self.page_size)).map_err(|_| {
            ProbeError::UnparseableCount {
                url: section.to_string(),
                text: item_count.to_string(),
            }
        })?;

        tracing::debug!(
            "Section {} declares {} items across {} pages",
            section,
            item_count,
            pages
        );
        Ok(pages)
    }
}
