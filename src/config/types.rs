use serde::Deserialize;

/// Main configuration structure for Catalog-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "section")]
    pub sections: Vec<SectionEntry>,
}

/// Crawl scheduling and retry behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of sections probed and crawled at the same time
    #[serde(rename = "max-concurrent-sections")]
    pub max_concurrent_sections: u32,

    /// Maximum number of page fetches in flight across all sections (0 = unbounded)
    #[serde(rename = "max-concurrent-pages")]
    pub max_concurrent_pages: u32,

    /// Number of retry passes run over failed pages, and again over failed sections
    #[serde(rename = "max-retry-passes")]
    pub max_retry_passes: u32,

    /// Base delay before a retry pass (milliseconds, doubled every pass, 0 = none)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sections: 10,
            max_concurrent_pages: 0,
            max_retry_passes: 10,
            retry_backoff_ms: 0,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Whether proxy settings from the environment are honored
    #[serde(rename = "trust-env-proxy")]
    pub trust_env_proxy: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("catalog-sweep/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            trust_env_proxy: true,
        }
    }
}

/// Site-specific pagination and count indicator settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Number of products shown on one result page
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Query parameter carrying the 1-based page number
    #[serde(rename = "page-param")]
    pub page_param: String,

    /// CSS selector of the element holding the total item count
    #[serde(rename = "count-selector")]
    pub count_selector: String,

    /// Regex applied to the indicator text; group 1 holds the count
    #[serde(rename = "count-pattern")]
    pub count_pattern: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: 24,
            page_param: "p".to_string(),
            count_selector: "span[data-category-products-count]".to_string(),
            count_pattern: r"(\d[\d\s]*)\s+продукт".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON Lines file receiving every collected record
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Optional path of a markdown run summary
    #[serde(rename = "summary-path")]
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_path: "products.jsonl".to_string(),
            summary_path: None,
        }
    }
}

/// One catalog section to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct SectionEntry {
    /// Base address of the section's first result page
    pub url: String,
}
