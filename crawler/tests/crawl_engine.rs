use async_trait::async_trait;
use crawler::{CrawlConfig, CrawlError, Crawler, Fetcher, HtmlExtractor};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

const FILLER: &str = "This page talks about crawling and indexing at some length so that the \
    extracted text is comfortably above the minimum content threshold used by the crawler.";

/// In-memory site. Unknown URLs fail like a connection error.
#[derive(Default)]
struct MockSite {
    pages: HashMap<String, String>,
    latency: HashMap<String, Duration>,
    fetched: Mutex<Vec<(String, tokio::time::Instant)>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl MockSite {
    fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages.insert(url.to_string(), html(url, links));
        self
    }

    fn raw(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    fn slow(mut self, url: &str, latency: Duration) -> Self {
        self.latency.insert(url.to_string(), latency);
        self
    }

    fn fetch_count(&self, url: &str) -> usize {
        self.fetched.lock().iter().filter(|(u, _)| u == url).count()
    }
}

#[async_trait]
impl Fetcher for MockSite {
    async fn fetch(&self, url: &Url) -> Result<String, CrawlError> {
        self.fetched.lock().push((url.to_string(), tokio::time::Instant::now()));
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let latency = self.latency.get(url.as_str()).copied().unwrap_or(Duration::from_millis(5));
        tokio::time::sleep(latency).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.pages.get(url.as_str()).cloned().ok_or_else(|| CrawlError::fetch(url, "connection refused"))
    }
}

fn html(url: &str, links: &[&str]) -> String {
    let anchors: String = links.iter().map(|l| format!("<a href=\"{l}\">link</a>")).collect();
    format!("<html><head><title>Page {url}</title></head><body><p>{FILLER}</p>{anchors}</body></html>")
}

fn config() -> CrawlConfig {
    CrawlConfig::default()
        .with_delay(Duration::ZERO)
        .with_concurrency(4)
        .with_max_depth(3)
        .with_max_pages(100)
}

fn urls(pages: &[search_core::WebPage]) -> HashSet<String> {
    pages.iter().map(|p| p.url.clone()).collect()
}

async fn crawl(site: MockSite, config: CrawlConfig, seeds: &[&str]) -> (Vec<search_core::WebPage>, std::sync::Arc<MockSite>) {
    let site = std::sync::Arc::new(site);
    let crawler = Crawler::new(config, SharedSite(site.clone()), HtmlExtractor::new());
    let pages = crawler.crawl(seeds).await.expect("seeds parse");
    (pages, site)
}

struct SharedSite(std::sync::Arc<MockSite>);

#[async_trait]
impl Fetcher for SharedSite {
    async fn fetch(&self, url: &Url) -> Result<String, CrawlError> {
        self.0.fetch(url).await
    }
}

#[tokio::test]
async fn seed_with_five_links_at_depth_one() {
    let children = ["/a", "/b", "/c", "/d", "/e"];
    let mut site = MockSite::default().page("https://site.test/", &children);
    for c in children {
        let url = format!("https://site.test{c}");
        site = site.page(&url, &["/deeper"]);
    }
    site = site.page("https://site.test/deeper", &[]);

    let (pages, site) = crawl(site, config().with_max_depth(1).with_max_pages(10), &["https://site.test/"]).await;

    let got = urls(&pages);
    assert_eq!(got.len(), 6);
    assert!(got.contains("https://site.test/"));
    for c in children {
        assert!(got.contains(&format!("https://site.test{c}")));
    }
    assert_eq!(site.fetch_count("https://site.test/deeper"), 0, "depth 2 is never fetched");
}

#[tokio::test]
async fn never_exceeds_max_pages() {
    let links: Vec<String> = (0..30).map(|i| format!("/p{i}")).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    let mut site = MockSite::default().page("https://site.test/", &link_refs);
    for l in &links {
        site = site.page(&format!("https://site.test{l}"), &link_refs);
    }

    let (pages, _) = crawl(site, config().with_max_pages(7).with_concurrency(6), &["https://site.test/"]).await;
    assert_eq!(pages.len(), 7);
}

#[tokio::test]
async fn duplicate_seeds_and_self_links_are_fetched_once() {
    let site = MockSite::default()
        .page("https://site.test/", &["/", "https://site.test/#top", "/other"])
        .page("https://site.test/other", &["/", "/other"]);

    let seeds = ["https://site.test/", "https://site.test/", "https://site.test/#intro"];
    let (pages, site) = crawl(site, config(), &seeds).await;

    assert_eq!(pages.len(), 2);
    assert_eq!(urls(&pages).len(), 2);
    assert_eq!(site.fetch_count("https://site.test/"), 1);
    assert_eq!(site.fetch_count("https://site.test/other"), 1);
}

#[tokio::test]
async fn filter_applies_to_every_link() {
    let site = MockSite::default()
        .page("https://site.test/", &[
            "https://elsewhere.test/",
            "/admin/panel",
            "/api/items",
            "/report.pdf",
            "/ok",
        ])
        .page("https://site.test/ok", &[])
        .page("https://elsewhere.test/", &[]);

    let config = config().with_seed_domains(&["https://site.test/"]);
    let (pages, site) = crawl(site, config.clone(), &["https://site.test/"]).await;

    assert_eq!(urls(&pages), HashSet::from(["https://site.test/".to_string(), "https://site.test/ok".to_string()]));
    assert!(pages.iter().all(|p| config.is_allowed_url(&p.url)));
    assert_eq!(site.fetched.lock().len(), 2);
}

#[tokio::test]
async fn failures_do_not_stop_the_crawl() {
    let site = MockSite::default()
        .page("https://site.test/", &["/missing", "/thin", "/good"])
        .raw("https://site.test/thin", "<html><body>too short</body></html>")
        .page("https://site.test/good", &[]);

    let (pages, site) = crawl(site, config(), &["https://site.test/"]).await;

    assert_eq!(urls(&pages), HashSet::from(["https://site.test/".to_string(), "https://site.test/good".to_string()]));
    assert_eq!(site.fetch_count("https://site.test/missing"), 1, "failed urls are not retried");
    assert_eq!(site.fetch_count("https://site.test/thin"), 1);
}

#[tokio::test]
async fn idle_workers_wait_for_slow_pages() {
    // with 4 workers and one seed, three workers find the frontier empty
    // while the seed is still being fetched
    let site = MockSite::default()
        .page("https://site.test/", &["/x", "/y"])
        .page("https://site.test/x", &["/z"])
        .page("https://site.test/y", &[])
        .page("https://site.test/z", &[])
        .slow("https://site.test/", Duration::from_millis(80))
        .slow("https://site.test/x", Duration::from_millis(40));

    let (pages, _) = crawl(site, config(), &["https://site.test/"]).await;
    assert_eq!(pages.len(), 4);
}

#[tokio::test]
async fn concurrent_fetches_stay_within_permits() {
    let links: Vec<String> = (0..20).map(|i| format!("/p{i}")).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    let mut site = MockSite::default().page("https://site.test/", &link_refs);
    for l in &links {
        site = site.page(&format!("https://site.test{l}"), &[]).slow(&format!("https://site.test{l}"), Duration::from_millis(20));
    }

    let (pages, site) = crawl(site, config().with_concurrency(3), &["https://site.test/"]).await;
    assert_eq!(pages.len(), 21);
    let peak = site.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {peak}");
    assert!(peak >= 2, "workers should overlap, peak {peak}");
}

#[tokio::test(start_paused = true)]
async fn fetches_are_spaced_pool_wide() {
    let site = MockSite::default()
        .page("https://site.test/", &["/a", "/b", "/c"])
        .page("https://site.test/a", &[])
        .page("https://site.test/b", &[])
        .page("https://site.test/c", &[]);

    let config = config().with_delay(Duration::from_millis(50)).with_concurrency(3);
    let (pages, site) = crawl(site, config, &["https://site.test/"]).await;
    assert_eq!(pages.len(), 4);

    let mut times: Vec<tokio::time::Instant> = site.fetched.lock().iter().map(|(_, t)| *t).collect();
    times.sort();
    assert_eq!(times.len(), 4);
    assert!(times.windows(2).all(|pair| pair[1] > pair[0]), "two fetches shared a slot");
    assert!(times[3] - times[0] >= Duration::from_millis(150));
}

#[tokio::test]
async fn unparseable_seed_is_a_config_error() {
    let crawler = Crawler::new(config(), MockSite::default(), HtmlExtractor::new());
    let err = crawler.crawl(&["https://site.test/", "not a url"]).await.unwrap_err();
    assert!(matches!(err, CrawlError::InvalidSeed { ref url, .. } if url == "not a url"));
}

#[tokio::test]
async fn rejected_seeds_produce_an_empty_crawl() {
    let site = MockSite::default().page("https://site.test/", &[]);
    let config = config().with_allowed_domains(["other.test"]);
    let (pages, site) = crawl(site, config, &["https://site.test/", "ftp://site.test/file"]).await;
    assert!(pages.is_empty());
    assert!(site.fetched.lock().is_empty());
}

#[tokio::test]
async fn pages_carry_extracted_fields() {
    let body = format!(
        "<html><head><title>Docs</title><meta name=\"description\" content=\"All the docs\">\
         <meta name=\"keywords\" content=\"rust, search\"></head>\
         <body><h1>Intro</h1><h2>Usage</h2><p>{FILLER}</p></body></html>"
    );
    let site = MockSite::default().raw("https://site.test/docs", &body);
    let (pages, _) = crawl(site, config(), &["https://site.test/docs"]).await;

    let page = &pages[0];
    assert_eq!(page.title, "Docs");
    assert_eq!(page.meta_description, "All the docs");
    assert_eq!(page.keywords, vec!["rust", "search"]);
    assert_eq!(page.headings, vec!["Intro", "Usage"]);
    assert_eq!(page.content_length, page.content.chars().count());
}
