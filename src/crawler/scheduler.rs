//! Crawl scheduler: concurrency gates and the initial pass
//!
//! This module handles:
//! - Admitting sections through the section gate
//! - Fanning out one fetch task per page of an admitted section
//! - Optionally bounding page fetches through a global page gate
//! - Routing typed failures into the page and section failure sets

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::prober::SectionProber;
use crate::state::{FailureSet, PageUnit, SectionTarget};
use std::collections::HashMap;
use std::ops::AddAssign;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Counters for one pass over sections or pages
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassStats {
    pub sections_crawled: usize,
    pub sections_failed: usize,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub records: usize,
}

impl AddAssign for PassStats {
    fn add_assign(&mut self, other: Self) {
        self.sections_crawled += other.sections_crawled;
        self.sections_failed += other.sections_failed;
        self.pages_fetched += other.pages_fetched;
        self.pages_failed += other.pages_failed;
        self.records += other.records;
    }
}

/// Scheduler owns the concurrency gates and the failure sets
///
/// The section gate bounds how many sections are probed and crawled at
/// once; a section holds its slot until all of its pages are done. The page
/// gate is optional: without it an admitted section issues every page
/// request at once.
///
/// Cloning yields another handle sharing the same gates and failure sets.
#[derive(Clone)]
pub struct Scheduler {
    prober: SectionProber,
    fetcher: PageFetcher,
    section_gate: Arc<Semaphore>,
    page_gate: Option<Arc<Semaphore>>,
    page_failures: FailureSet<PageUnit>,
    section_failures: FailureSet<SectionTarget>,
}

impl Scheduler {
    /// Creates a scheduler with gates sized from the crawler configuration
    ///
    /// `max_concurrent_pages = 0` leaves page fan-out unbounded.
    pub fn new(prober: SectionProber, fetcher: PageFetcher, config: &CrawlerConfig) -> Self {
        let section_gate = Arc::new(Semaphore::new(
            config.max_concurrent_sections.max(1) as usize,
        ));
        let page_gate = match config.max_concurrent_pages {
            0 => None,
            limit => Some(Arc::new(Semaphore::new(limit as usize))),
        };

        Self {
            prober,
            fetcher,
            section_gate,
            page_gate,
            page_failures: FailureSet::new(),
            section_failures: FailureSet::new(),
        }
    }

    /// Pages whose most recent fetch attempt failed
    pub fn page_failures(&self) -> &FailureSet<PageUnit> {
        &self.page_failures
    }

    /// Sections whose most recent probe failed
    pub fn section_failures(&self) -> &FailureSet<SectionTarget> {
        &self.section_failures
    }

    /// Probes and crawls every section once
    pub async fn run_initial_pass(&self, sections: &[SectionTarget]) -> PassStats {
        tracing::info!("Starting initial pass over {} sections", sections.len());
        let stats = self.crawl_sections(sections.to_vec()).await;
        tracing::info!(
            "Initial pass done: {} sections crawled, {} failed; {} pages fetched, {} failed; {} records",
            stats.sections_crawled,
            stats.sections_failed,
            stats.pages_fetched,
            stats.pages_failed,
            stats.records
        );
        stats
    }

    /// Probes and crawls the given sections, returning once all are done
    ///
    /// Sections whose probe fails, or whose task panics, are added to the
    /// section failure set. Page failures inside crawled sections go to the
    /// page failure set.
    pub async fn crawl_sections(&self, sections: Vec<SectionTarget>) -> PassStats {
        let mut stats = PassStats::default();
        let mut tasks = JoinSet::new();
        let mut in_flight = HashMap::new();

        for section in sections {
            let scheduler = self.clone();
            let target = section.clone();
            let handle = tasks.spawn(async move { scheduler.crawl_section(&target).await });
            in_flight.insert(handle.id(), section);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, Ok(section_stats))) => {
                    in_flight.remove(&id);
                    stats.sections_crawled += 1;
                    stats += section_stats;
                }
                Ok((id, Err(e))) => {
                    if let Some(section) = in_flight.remove(&id) {
                        tracing::warn!("Probe failed for {}: {}", section, e);
                        self.section_failures.insert(section);
                    }
                    stats.sections_failed += 1;
                }
                Err(e) => {
                    // A panicked section is retried like a failed probe
                    match in_flight.remove(&e.id()) {
                        Some(section) => {
                            tracing::error!("Section task for {} aborted: {}", section, e);
                            self.section_failures.insert(section);
                        }
                        None => tracing::error!("Section task aborted: {}", e),
                    }
                    stats.sections_failed += 1;
                }
            }
        }

        stats
    }

    /// Fetches the given pages, returning once all are done
    ///
    /// Only the page gate applies. Failed pages, including pages whose task
    /// panicked, are added to the page failure set.
    pub async fn fetch_pages(&self, units: Vec<PageUnit>) -> PassStats {
        let mut stats = PassStats::default();
        let mut tasks = JoinSet::new();
        let mut in_flight = HashMap::new();

        for unit in units {
            let scheduler = self.clone();
            let target = unit.clone();
            let handle = tasks.spawn(async move { scheduler.fetch_page(&target).await });
            in_flight.insert(handle.id(), unit);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (unit, outcome) = match joined {
                Ok((id, outcome)) => (in_flight.remove(&id), Ok(outcome)),
                Err(e) => (in_flight.remove(&e.id()), Err(e)),
            };
            let Some(unit) = unit else {
                stats.pages_failed += 1;
                continue;
            };

            match outcome {
                Ok(Ok(records)) => {
                    tracing::debug!("Fetched {}: {} records", unit, records);
                    stats.pages_fetched += 1;
                    stats.records += records;
                }
                Ok(Err(e)) => {
                    log_fetch_failure(&unit, &e);
                    self.page_failures.insert(unit);
                    stats.pages_failed += 1;
                }
                Err(e) => {
                    tracing::error!("Page task for {} aborted: {}", unit, e);
                    self.page_failures.insert(unit);
                    stats.pages_failed += 1;
                }
            }
        }

        stats
    }

    /// Probes one section under the section gate and fetches all its pages
    async fn crawl_section(
        &self,
        section: &SectionTarget,
    ) -> Result<PassStats, crate::crawler::ProbeError> {
        // Gates are never closed, so acquisition only waits
        let _permit = self.section_gate.acquire().await.ok();

        let pages = self.prober.probe(section).await?;
        if pages == 0 {
            tracing::info!("Section {} has no pages", section);
            return Ok(PassStats::default());
        }

        tracing::info!("Section {}: fetching {} pages", section, pages);
        let stats = self.fetch_pages(section.pages(pages)).await;
        tracing::info!(
            "Section {} done: {} pages fetched, {} failed, {} records",
            section,
            stats.pages_fetched,
            stats.pages_failed,
            stats.records
        );
        Ok(stats)
    }

    /// Fetches one page under the page gate, if there is one
    async fn fetch_page(&self, unit: &PageUnit) -> Result<usize, FetchError> {
        let _permit = match &self.page_gate {
            Some(gate) => gate.acquire().await.ok(),
            None => None,
        };

        self.fetcher.fetch_page(unit).await
    }
}

fn log_fetch_failure(unit: &PageUnit, error: &FetchError) {
    if error.is_timeout() {
        tracing::warn!("Fetch timed out for {}", unit);
    } else if let Some(status) = error.status() {
        tracing::warn!("Fetch of {} returned HTTP {}", unit, status);
    } else {
        tracing::warn!("Fetch failed for {}: {}", unit, error);
    }
}
