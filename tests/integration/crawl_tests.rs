//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock catalog sites and run the full
//! probe, fetch, retry and write cycle end-to-end.

use catalog_sweep::config::{
    CatalogConfig, Config, CrawlerConfig, HttpConfig, OutputConfig, SectionEntry,
};
use catalog_sweep::crawler::{Coordinator, ProductCardExtractor, RecordExtractor};
use catalog_sweep::output::ProductRecord;
use catalog_sweep::state::SectionTarget;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, Respond, ResponseTemplate};

/// Matches requests without a page parameter (section landing pages)
struct LandingPage;

impl Match for LandingPage {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == "p")
    }
}

/// Matches requests for a numbered result page
struct ResultPage;

impl Match for ResultPage {
    fn matches(&self, request: &Request) -> bool {
        !LandingPage.matches(request)
    }
}

/// Creates a test configuration crawling the given sections
fn create_test_config(sections: Vec<String>, dir: &Path, max_retry_passes: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_concurrent_sections: 3,
            max_concurrent_pages: 0,
            max_retry_passes,
            retry_backoff_ms: 0,
        },
        http: HttpConfig {
            user_agent: "TestSweep/1.0".to_string(),
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
            trust_env_proxy: false,
        },
        catalog: CatalogConfig::default(),
        output: OutputConfig {
            records_path: records_path(dir).to_string_lossy().into_owned(),
            summary_path: None,
        },
        sections: sections
            .into_iter()
            .map(|url| SectionEntry { url })
            .collect(),
    }
}

fn records_path(dir: &Path) -> PathBuf {
    dir.join("products.jsonl")
}

/// Landing page declaring `items` products
fn landing(items: &str) -> String {
    format!(
        r#"<html><body><h1>Catalog</h1>
        <span data-category-products-count>{} продуктов</span>
        </body></html>"#,
        items
    )
}

/// Result page with `count` product cards whose SKUs start with `prefix`
fn cards(prefix: &str, count: usize) -> String {
    let mut body = String::from("<html><body>");
    for i in 1..=count {
        body.push_str(&format!(
            r#"<article>
                <meta itemprop="sku" content="{prefix}-{i}">
                <span class="KkVNn">Товар {prefix}-{i}</span>
                <meta itemprop="availability" content="https://schema.org/InStock">
            </article>"#
        ));
    }
    body.push_str("</body></html>");
    body
}

async fn mount_landing(server: &MockServer, section: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(section))
        .and(LandingPage)
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, section: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(section))
        .and(query_param("p", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

fn read_records(dir: &Path) -> Vec<ProductRecord> {
    std::fs::read_to_string(records_path(dir))
        .expect("Failed to read output")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Invalid record line"))
        .collect()
}

fn ids(records: &[ProductRecord]) -> HashSet<String> {
    records
        .iter()
        .filter_map(|record| record.product_id.clone())
        .collect()
}

#[tokio::test]
async fn test_retried_page_is_recovered() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_landing(&server, "/a", landing("50")).await;
    mount_page(&server, "/a", 1, cards("p1", 5)).await;
    mount_page(&server, "/a", 3, cards("p3", 3)).await;

    // Page 2 fails on the initial pass and succeeds on the first retry
    Mock::given(method("GET"))
        .and(path("/a"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/a", 2, cards("p2", 4)).await;

    let config = create_test_config(vec![format!("{}/a", server.uri())], dir.path(), 10);
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    assert_eq!(summary.records_written, 12);
    assert_eq!(summary.page_retry_passes, 1);
    assert_eq!(summary.section_retry_passes, 0);
    assert!(summary.is_complete());
    assert!(coordinator.scheduler().page_failures().is_empty());
    assert!(coordinator.scheduler().section_failures().is_empty());

    let records = read_records(dir.path());
    assert_eq!(records.len(), 12);
    assert_eq!(ids(&records).len(), 12);
    assert!(ids(&records).contains("p2-4"));
}

#[tokio::test]
async fn test_always_failing_probe_stops_at_ceiling() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // Section B: initial probe plus exactly ten retries
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(500))
        .expect(11)
        .mount(&server)
        .await;

    // Section A is healthy and unaffected
    mount_landing(&server, "/a", landing("10")).await;
    mount_page(&server, "/a", 1, cards("a", 10)).await;

    let section_b = format!("{}/b", server.uri());
    let config = create_test_config(
        vec![format!("{}/a", server.uri()), section_b.clone()],
        dir.path(),
        10,
    );
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    assert_eq!(summary.section_retry_passes, 10);
    assert_eq!(summary.page_retry_passes, 0);
    assert_eq!(
        summary.failed_sections,
        vec![SectionTarget::parse(&section_b).unwrap()]
    );
    assert_eq!(coordinator.scheduler().section_failures().len(), 1);

    let records = read_records(dir.path());
    assert_eq!(records.len(), 10);
    assert!(records
        .iter()
        .all(|r| r.product_id.as_deref().unwrap_or_default().starts_with("a-")));
}

#[tokio::test]
async fn test_failed_page_does_not_block_siblings() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_landing(&server, "/a", landing("72")).await;
    mount_page(&server, "/a", 1, cards("p1", 24)).await;
    mount_page(&server, "/a", 3, cards("p3", 24)).await;

    // Initial attempt plus three retry passes
    Mock::given(method("GET"))
        .and(path("/a"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let section_a = format!("{}/a", server.uri());
    let config = create_test_config(vec![section_a.clone()], dir.path(), 3);
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    assert_eq!(summary.records_written, 48);
    assert_eq!(summary.page_retry_passes, 3);
    assert_eq!(
        summary.failed_pages,
        vec![SectionTarget::parse(&section_a).unwrap().page(2)]
    );
    assert!(summary.failed_sections.is_empty());
    assert!(!summary.is_complete());
}

#[tokio::test]
async fn test_empty_sections_fetch_no_pages() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_landing(&server, "/zero", landing("0")).await;
    mount_landing(
        &server,
        "/no-indicator",
        "<html><body>Раздел пуст</body></html>".to_string(),
    )
    .await;

    Mock::given(method("GET"))
        .and(query_param("p", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(cards("x", 1)))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(
        vec![
            format!("{}/zero", server.uri()),
            format!("{}/no-indicator", server.uri()),
        ],
        dir.path(),
        10,
    );
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    assert_eq!(summary.records_written, 0);
    assert!(summary.is_complete());
    assert!(read_records(dir.path()).is_empty());
}

#[tokio::test]
async fn test_unparseable_count_is_a_section_failure() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/a"))
        .and(LandingPage)
        .respond_with(ResponseTemplate::new(200).set_body_string(landing("много")))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(vec![format!("{}/a", server.uri())], dir.path(), 2);
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    assert_eq!(summary.section_retry_passes, 2);
    assert_eq!(summary.failed_sections.len(), 1);
    assert_eq!(summary.records_written, 0);
}

#[tokio::test]
async fn test_section_recovers_on_retry() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/a"))
        .and(LandingPage)
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_landing(&server, "/a", landing("30")).await;
    mount_page(&server, "/a", 1, cards("p1", 24)).await;
    mount_page(&server, "/a", 2, cards("p2", 6)).await;

    let config = create_test_config(vec![format!("{}/a", server.uri())], dir.path(), 10);
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    assert_eq!(summary.section_retry_passes, 1);
    assert_eq!(summary.records_written, 30);
    assert!(summary.is_complete());
}

#[tokio::test]
async fn test_bounded_page_gate_completes() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_landing(&server, "/a", landing("120")).await;
    for page in 1..=5 {
        mount_page(&server, "/a", page, cards(&format!("p{}", page), 24)).await;
    }

    let mut config = create_test_config(vec![format!("{}/a", server.uri())], dir.path(), 10);
    config.crawler.max_concurrent_pages = 1;
    config.crawler.max_concurrent_sections = 1;

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    assert_eq!(summary.records_written, 120);
    assert_eq!(ids(&read_records(dir.path())).len(), 120);
}

#[tokio::test]
async fn test_output_keeps_non_ascii_and_absent_fields() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_landing(&server, "/a", landing("1")).await;
    mount_page(
        &server,
        "/a",
        1,
        r#"<article><span class="KkVNn">Крем для рук</span></article>"#.to_string(),
    )
    .await;

    let mut config = create_test_config(vec![format!("{}/a", server.uri())], dir.path(), 10);
    config.output.summary_path = Some(dir.path().join("summary.md").to_string_lossy().into_owned());

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    coordinator.run().await.expect("Crawl failed");

    let content = std::fs::read_to_string(records_path(dir.path())).unwrap();
    assert!(content.contains("Крем для рук"));
    assert!(content.contains(r#""brand":null"#));
    assert!(content.contains(r#""in_stock":false"#));

    let summary = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
    assert!(summary.contains("All sections and pages were collected."));
}

/// Treats every non-empty line of the body as one product name
struct LineExtractor;

impl RecordExtractor for LineExtractor {
    fn extract(&self, body: &str) -> Vec<ProductRecord> {
        body.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| ProductRecord {
                name: Some(line.to_string()),
                ..ProductRecord::default()
            })
            .collect()
    }
}

#[tokio::test]
async fn test_custom_extractor() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_landing(&server, "/a", landing("25")).await;
    mount_page(&server, "/a", 1, "alpha\nbeta\n".to_string()).await;
    mount_page(&server, "/a", 2, "gamma".to_string()).await;

    let config = create_test_config(vec![format!("{}/a", server.uri())], dir.path(), 10);
    let coordinator = Coordinator::with_extractor(config, Arc::new(LineExtractor))
        .expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    assert_eq!(summary.records_written, 3);
    let mut names: Vec<String> = read_records(dir.path())
        .into_iter()
        .filter_map(|record| record.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);
}

/// Delegates to the product card extractor but panics on a marker body
struct PanicOnMarker;

impl RecordExtractor for PanicOnMarker {
    fn extract(&self, body: &str) -> Vec<ProductRecord> {
        if body.contains("boom") {
            panic!("extractor failed on marker page");
        }
        ProductCardExtractor::new().extract(body)
    }
}

#[tokio::test]
async fn test_panicking_page_is_recorded_and_retried() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_landing(&server, "/a", landing("48")).await;
    mount_page(&server, "/a", 1, cards("p1", 1)).await;

    // Initial attempt plus two retry passes
    Mock::given(method("GET"))
        .and(path("/a"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let section_a = format!("{}/a", server.uri());
    let config = create_test_config(vec![section_a.clone()], dir.path(), 2);
    let coordinator = Coordinator::with_extractor(config, Arc::new(PanicOnMarker))
        .expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    assert_eq!(summary.records_written, 1);
    assert_eq!(summary.page_retry_passes, 2);
    assert_eq!(
        summary.failed_pages,
        vec![SectionTarget::parse(&section_a).unwrap().page(2)]
    );
    assert!(!summary.is_complete());
}

/// One request as seen by the mock server
#[derive(Debug, Clone)]
struct Arrival {
    path: String,
    page: Option<String>,
    at: Instant,
}

/// Shared log of request arrival times
#[derive(Clone, Default)]
struct ArrivalLog {
    arrivals: Arc<Mutex<Vec<Arrival>>>,
}

impl ArrivalLog {
    /// A responder that records into this log and answers after `delay`
    fn responder(&self, body: String, delay: Duration) -> TimedResponder {
        TimedResponder {
            log: self.clone(),
            body,
            delay,
        }
    }

    fn arrivals(&self) -> Vec<Arrival> {
        let mut arrivals = self.arrivals.lock().unwrap().clone();
        arrivals.sort_by_key(|arrival| arrival.at);
        arrivals
    }

    /// Largest number of matching requests that arrived within `window`
    ///
    /// With every response held for longer than `window`, requests arriving
    /// that close together were all in flight at the same moment.
    fn peak_within(&self, window: Duration, pages: bool) -> usize {
        let times: Vec<Instant> = self
            .arrivals()
            .into_iter()
            .filter(|arrival| arrival.page.is_some() == pages)
            .map(|arrival| arrival.at)
            .collect();

        let mut peak = 0;
        let mut start = 0;
        for end in 0..times.len() {
            while times[end] - times[start] >= window {
                start += 1;
            }
            peak = peak.max(end - start + 1);
        }
        peak
    }
}

struct TimedResponder {
    log: ArrivalLog,
    body: String,
    delay: Duration,
}

impl Respond for TimedResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let page = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "p")
            .map(|(_, value)| value.into_owned());
        self.log.arrivals.lock().unwrap().push(Arrival {
            path: request.url.path().to_string(),
            page,
            at: Instant::now(),
        });

        ResponseTemplate::new(200)
            .set_body_string(self.body.clone())
            .set_delay(self.delay)
    }
}

async fn mount_timed_page(server: &MockServer, log: &ArrivalLog, section: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(section))
        .and(ResultPage)
        .respond_with(log.responder(cards(section.trim_start_matches('/'), 1), delay))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_section_gate_bounds_concurrent_sections() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let log = ArrivalLog::default();
    let delay = Duration::from_millis(300);

    let mut sections = Vec::new();
    for name in ["a", "b", "c", "d", "e"] {
        Mock::given(method("GET"))
            .and(path(format!("/{}", name)))
            .and(LandingPage)
            .respond_with(log.responder(landing("0"), delay))
            .expect(1)
            .mount(&server)
            .await;
        sections.push(format!("{}/{}", server.uri(), name));
    }

    let mut config = create_test_config(sections, dir.path(), 0);
    config.crawler.max_concurrent_sections = 2;

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    assert!(summary.is_complete());
    assert_eq!(log.arrivals().len(), 5);
    assert_eq!(log.peak_within(delay / 2, false), 2);
}

#[tokio::test]
async fn test_section_holds_slot_until_pages_finish() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let log = ArrivalLog::default();
    let delay = Duration::from_millis(300);

    for section in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(section))
            .and(LandingPage)
            .respond_with(log.responder(landing("48"), Duration::ZERO))
            .mount(&server)
            .await;
        mount_timed_page(&server, &log, section, delay).await;
    }

    let mut config = create_test_config(
        vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())],
        dir.path(),
        0,
    );
    config.crawler.max_concurrent_sections = 1;

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");
    assert_eq!(summary.records_written, 4);

    let arrivals = log.arrivals();
    let landings: Vec<&Arrival> = arrivals.iter().filter(|a| a.page.is_none()).collect();
    assert_eq!(landings.len(), 2);
    let (first, second) = (landings[0], landings[1]);

    let first_pages: Vec<Instant> = arrivals
        .iter()
        .filter(|a| a.page.is_some() && a.path == first.path)
        .map(|a| a.at)
        .collect();
    assert_eq!(first_pages.len(), 2);

    // The second section is admitted only after the first one's pages answered
    let last_page = first_pages.into_iter().max().unwrap();
    assert!(second.at >= last_page + delay - Duration::from_millis(50));
}

#[tokio::test]
async fn test_unbounded_page_fan_out() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let log = ArrivalLog::default();
    let delay = Duration::from_millis(300);

    mount_landing(&server, "/a", landing("144")).await;
    mount_timed_page(&server, &log, "/a", delay).await;

    let config = create_test_config(vec![format!("{}/a", server.uri())], dir.path(), 0);
    assert_eq!(config.crawler.max_concurrent_pages, 0);

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    assert_eq!(summary.records_written, 6);
    assert_eq!(log.peak_within(delay / 2, true), 6);
}

#[tokio::test]
async fn test_page_gate_bounds_concurrent_fetches() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let log = ArrivalLog::default();
    let delay = Duration::from_millis(200);

    mount_landing(&server, "/a", landing("96")).await;
    mount_landing(&server, "/b", landing("96")).await;
    mount_timed_page(&server, &log, "/a", delay).await;
    mount_timed_page(&server, &log, "/b", delay).await;

    let mut config = create_test_config(
        vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())],
        dir.path(),
        0,
    );
    config.crawler.max_concurrent_pages = 2;

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Crawl failed");

    // The gate is shared by both sections
    assert_eq!(summary.records_written, 8);
    assert_eq!(log.arrivals().len(), 8);
    assert_eq!(log.peak_within(delay / 2, true), 2);
}
