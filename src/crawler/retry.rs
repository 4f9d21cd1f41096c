//! Retry controller: bounded passes over failed pages and sections
//!
//! After the initial pass, failed pages are re-attempted first, pass after
//! pass, until none fail or the pass ceiling is reached. Failed sections are
//! then re-probed and re-crawled the same way. Each pass drains its failure
//! set up front, so failures during the pass land in a fresh set for the
//! next one.

use crate::config::CrawlerConfig;
use crate::crawler::scheduler::Scheduler;
use std::time::Duration;

/// Number of retry passes each loop actually ran
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RetryReport {
    pub page_passes: u32,
    pub section_passes: u32,
}

/// Drives the page and section retry loops
#[derive(Debug, Clone)]
pub struct RetryController {
    max_passes: u32,
    backoff_base: Duration,
}

impl RetryController {
    /// Creates a controller running at most `max_passes` passes per loop
    ///
    /// A zero `backoff_base` starts every pass immediately.
    pub fn new(max_passes: u32, backoff_base: Duration) -> Self {
        Self {
            max_passes,
            backoff_base,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_retry_passes,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    pub fn max_passes(&self) -> u32 {
        self.max_passes
    }

    /// Delay before the 1-based retry pass `pass`: `base * 2^(pass - 1)`
    pub fn backoff_before(&self, pass: u32) -> Duration {
        let exponent = pass.saturating_sub(1).min(31);
        self.backoff_base.saturating_mul(1u32 << exponent)
    }

    /// Runs the page retry loop, then the section retry loop
    pub async fn run(&self, scheduler: &Scheduler) -> RetryReport {
        let page_passes = self.retry_pages(scheduler).await;
        let section_passes = self.retry_sections(scheduler).await;

        RetryReport {
            page_passes,
            section_passes,
        }
    }

    /// Re-fetches failed pages until none fail or the ceiling is reached
    ///
    /// # Returns
    ///
    /// The number of passes run
    pub async fn retry_pages(&self, scheduler: &Scheduler) -> u32 {
        let failures = scheduler.page_failures();
        let mut pass = 0;

        while !failures.is_empty() && pass < self.max_passes {
            pass += 1;
            self.wait_before(pass).await;

            let units = failures.drain();
            tracing::info!(
                "Page retry pass {}/{}: {} pages",
                pass,
                self.max_passes,
                units.len()
            );

            let stats = scheduler.fetch_pages(units).await;
            tracing::info!(
                "Page retry pass {} done: {} recovered ({} records), {} still failing",
                pass,
                stats.pages_fetched,
                stats.records,
                failures.len()
            );
        }

        if !failures.is_empty() {
            tracing::warn!(
                "Giving up on {} pages after {} retry passes",
                failures.len(),
                pass
            );
        }
        pass
    }

    /// Re-probes and re-crawls failed sections until none fail or the
    /// ceiling is reached
    ///
    /// Pages that fail inside a re-crawled section are recorded in the page
    /// failure set but are not retried again, since the page loop has
    /// already finished.
    ///
    /// # Returns
    ///
    /// The number of passes run
    pub async fn retry_sections(&self, scheduler: &Scheduler) -> u32 {
        let failures = scheduler.section_failures();
        let mut pass = 0;

        while !failures.is_empty() && pass < self.max_passes {
            pass += 1;
            self.wait_before(pass).await;

            let sections = failures.drain();
            tracing::info!(
                "Section retry pass {}/{}: {} sections",
                pass,
                self.max_passes,
                sections.len()
            );

            let stats = scheduler.crawl_sections(sections).await;
            tracing::info!(
                "Section retry pass {} done: {} recovered ({} records), {} still failing",
                pass,
                stats.sections_crawled,
                stats.records,
                failures.len()
            );
        }

        if !failures.is_empty() {
            tracing::warn!(
                "Giving up on {} sections after {} retry passes",
                failures.len(),
                pass
            );
        }
        pass
    }

    async fn wait_before(&self, pass: u32) {
        let delay = self.backoff_before(pass);
        if !delay.is_zero() {
            tracing::debug!("Waiting {:?} before retry pass {}", delay, pass);
            tokio::time::sleep(delay).await;
        }
    }
}
