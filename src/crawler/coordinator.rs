//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the crawl together:
//! - Building the HTTP client, prober, fetcher and scheduler from config
//! - Running the initial pass and the retry passes
//! - Writing the collected records once, at the end
//! - Reporting the run summary

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, PageFetcher};
use crate::crawler::parser::{ProductCardExtractor, RecordExtractor};
use crate::crawler::prober::{CountIndicator, SectionProber};
use crate::crawler::retry::RetryController;
use crate::crawler::scheduler::Scheduler;
use crate::output::{generate_markdown_summary, CrawlSummary, RecordStore};
use crate::state::SectionTarget;
use crate::SweepError;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    sections: Vec<SectionTarget>,
    scheduler: Scheduler,
    retry: RetryController,
    store: RecordStore,
}

impl Coordinator {
    /// Creates a coordinator using the built-in product card extractor
    pub fn new(config: Config) -> Result<Self, SweepError> {
        Self::with_extractor(config, Arc::new(ProductCardExtractor::new()))
    }

    /// Creates a coordinator with a custom record extractor
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SweepError)` - A section URL, the count indicator or the HTTP
    ///   client could not be set up
    pub fn with_extractor(
        config: Config,
        extractor: Arc<dyn RecordExtractor>,
    ) -> Result<Self, SweepError> {
        let sections = config
            .sections
            .iter()
            .map(|entry| SectionTarget::parse(&entry.url))
            .collect::<Result<Vec<_>, _>>()?;

        let client = build_http_client(&config.http)?;
        let indicator = CountIndicator::from_config(&config.catalog)?;
        let store = RecordStore::new();

        let prober = SectionProber::new(client.clone(), indicator, config.catalog.page_size);
        let fetcher = PageFetcher::new(
            client,
            &config.catalog.page_param,
            extractor,
            store.clone(),
        );
        let scheduler = Scheduler::new(prober, fetcher, &config.crawler);
        let retry = RetryController::from_config(&config.crawler);

        Ok(Self {
            config,
            sections,
            scheduler,
            retry,
            store,
        })
    }

    /// The shared store receiving every extracted record
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// The scheduler, exposing the failure sets
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Runs the crawl to completion
    ///
    /// Failed pages and sections never abort the run; whatever was
    /// collected is written out. Only output errors are returned.
    pub async fn run(&self) -> Result<CrawlSummary, SweepError> {
        let started_at = Utc::now();
        tracing::info!(
            "Starting crawl of {} sections (section gate: {}, page gate: {})",
            self.sections.len(),
            self.config.crawler.max_concurrent_sections,
            match self.config.crawler.max_concurrent_pages {
                0 => "unbounded".to_string(),
                limit => limit.to_string(),
            }
        );

        self.scheduler.run_initial_pass(&self.sections).await;
        let report = self.retry.run(&self.scheduler).await;

        let records_path = Path::new(&self.config.output.records_path);
        let records_written = self.store.flush_all(records_path)?;

        let summary = CrawlSummary {
            started_at,
            finished_at: Utc::now(),
            records_path: self.config.output.records_path.clone(),
            sections_total: self.sections.len(),
            records_written,
            page_retry_passes: report.page_passes,
            section_retry_passes: report.section_passes,
            failed_pages: self.scheduler.page_failures().snapshot(),
            failed_sections: self.scheduler.section_failures().snapshot(),
        };

        if let Some(summary_path) = &self.config.output.summary_path {
            generate_markdown_summary(&summary, Path::new(summary_path))?;
            tracing::info!("Summary written to {}", summary_path);
        }

        summary.log();
        Ok(summary)
    }
}

/// Runs the main crawl operation
///
/// # Example
///
/// ```no_run
/// use catalog_sweep::config::load_config;
/// use catalog_sweep::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sweep.toml"))?;
/// let summary = run_crawl(config).await?;
/// println!("{} records written", summary.records_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlSummary, SweepError> {
    let coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
