//! Run summary and output error types
//!
//! This module defines the summary reported at the end of a crawl and the
//! error type shared by the output writers.

use crate::state::{PageUnit, SectionTarget};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    // Run metadata
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub records_path: String,

    // Work
    pub sections_total: usize,
    pub records_written: usize,
    pub page_retry_passes: u32,
    pub section_retry_passes: u32,

    // Units still failing after the last pass
    pub failed_pages: Vec<PageUnit>,
    pub failed_sections: Vec<SectionTarget>,
}

impl CrawlSummary {
    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }

    /// Returns true if every section and page was eventually fetched
    pub fn is_complete(&self) -> bool {
        self.failed_pages.is_empty() && self.failed_sections.is_empty()
    }

    /// Logs the summary through `tracing`
    pub fn log(&self) {
        tracing::info!(
            "Crawl finished in {}s: {} records from {} sections written to {}",
            self.duration_seconds(),
            self.records_written,
            self.sections_total,
            self.records_path
        );
        tracing::info!(
            "Retry passes: {} page, {} section",
            self.page_retry_passes,
            self.section_retry_passes
        );

        if self.is_complete() {
            return;
        }

        tracing::warn!(
            "{} pages and {} sections still failing after retries",
            self.failed_pages.len(),
            self.failed_sections.len()
        );
        for unit in &self.failed_pages {
            tracing::warn!("  missing page: {}", unit);
        }
        for section in &self.failed_sections {
            tracing::warn!("  missing section: {}", section);
        }
    }
}
