//! Crawler module for catalog fetching and processing
//!
//! This module contains the crawl-and-retry engine, including:
//! - HTTP fetching of landing pages and result pages
//! - Section probing for page counts
//! - Record extraction from product cards
//! - Gated scheduling of sections and pages
//! - Bounded retry passes over failures
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod prober;
mod retry;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, fetch_body, FetchError, PageFetcher};
pub use parser::{ProductCardExtractor, RecordExtractor};
pub use prober::{page_count, CountIndicator, ProbeError, SectionProber};
pub use retry::{RetryController, RetryReport};
pub use scheduler::{PassStats, Scheduler};
