//! Concurrent crawl engine.
//!
//! A fixed pool of workers shares one FIFO frontier. URLs are claimed exactly
//! once through the visited set, fetches are gated by a semaphore and spaced by
//! the pool-wide [`Pacer`], and the crawl ends by quiescence: when the frontier
//! is empty and no worker still holds an entry that could add links.

use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::extract::{HtmlExtractor, PageExtractor};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::pacing::Pacer;
use dashmap::DashSet;
use parking_lot::Mutex;
use search_core::WebPage;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use url::Url;

const PROGRESS_EVERY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: usize,
}

#[derive(Default)]
struct FrontierQueue {
    queue: VecDeque<FrontierEntry>,
    in_flight: usize,
}

/// FIFO queue plus a count of popped entries not yet finished.
struct Frontier {
    inner: Mutex<FrontierQueue>,
    changed: Notify,
}

impl Frontier {
    fn new(seeds: Vec<FrontierEntry>) -> Self {
        Self {
            inner: Mutex::new(FrontierQueue { queue: seeds.into(), in_flight: 0 }),
            changed: Notify::new(),
        }
    }

    /// Next entry, or `None` once the queue is empty and nothing is in flight.
    async fn next(&self) -> Option<FrontierEntry> {
        loop {
            let notified = {
                let mut q = self.inner.lock();
                if let Some(entry) = q.queue.pop_front() {
                    q.in_flight += 1;
                    return Some(entry);
                }
                if q.in_flight == 0 {
                    drop(q);
                    self.changed.notify_waiters();
                    return None;
                }
                // registered before the lock is released, so a finish() in
                // between cannot be missed
                self.changed.notified()
            };
            notified.await;
        }
    }

    fn finish(&self, links: Vec<FrontierEntry>) {
        {
            let mut q = self.inner.lock();
            q.queue.extend(links);
            q.in_flight -= 1;
        }
        self.changed.notify_waiters();
    }
}

/// Marks a popped entry finished on drop, including on early exit or panic.
struct InFlight<'a> {
    frontier: &'a Frontier,
    links: Vec<FrontierEntry>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.frontier.finish(std::mem::take(&mut self.links));
    }
}

struct CrawlState {
    frontier: Frontier,
    visited: DashSet<String>,
    pages: Mutex<Vec<WebPage>>,
    processed: AtomicUsize,
    failures: AtomicUsize,
    skipped: AtomicUsize,
    permits: Semaphore,
    pacer: Pacer,
    max_pages: usize,
}

impl CrawlState {
    fn limit_reached(&self) -> bool {
        self.processed.load(Ordering::Acquire) >= self.max_pages
    }

    /// Keep `page` unless `max_pages` pages were already recorded.
    fn try_record(&self, page: WebPage) -> Option<usize> {
        let max = self.max_pages;
        let prev = self
            .processed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
            .ok()?;
        self.pages.lock().push(page);
        Some(prev + 1)
    }
}

pub struct Crawler<F, E> {
    config: Arc<CrawlConfig>,
    fetcher: Arc<F>,
    extractor: Arc<E>,
}

impl Crawler<HttpFetcher, HtmlExtractor> {
    /// Crawler over real HTTP with the HTML extractor.
    pub fn http(config: CrawlConfig) -> Result<Self, CrawlError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::new(config, fetcher, HtmlExtractor::new()))
    }
}

impl<F, E> Crawler<F, E>
where
    F: Fetcher + 'static,
    E: PageExtractor + 'static,
{
    pub fn new(config: CrawlConfig, fetcher: F, extractor: E) -> Self {
        Self { config: Arc::new(config), fetcher: Arc::new(fetcher), extractor: Arc::new(extractor) }
    }

    pub fn config(&self) -> &CrawlConfig { &self.config }

    /// Crawl from `seeds` and return every page kept, in completion order.
    ///
    /// Fails only when a seed does not parse. Seeds outside the filter are
    /// skipped with a warning; per-page failures are logged and counted.
    pub async fn crawl<S: AsRef<str>>(&self, seeds: &[S]) -> Result<Vec<WebPage>, CrawlError> {
        let mut roots = Vec::new();
        for seed in seeds {
            match self.config.seed_url(seed.as_ref()) {
                Ok(url) => roots.push(FrontierEntry { url, depth: 0 }),
                Err(err @ CrawlError::Rejected { .. }) => warn!(error = %err, "seed skipped"),
                Err(err) => return Err(err),
            }
        }

        let workers = self.config.max_concurrent_requests.max(1);
        info!(
            seeds = roots.len(),
            max_depth = self.config.max_depth,
            max_pages = self.config.max_pages,
            workers,
            "starting crawl"
        );

        let state = Arc::new(CrawlState {
            frontier: Frontier::new(roots),
            visited: DashSet::new(),
            pages: Mutex::new(Vec::new()),
            processed: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            permits: Semaphore::new(workers),
            pacer: Pacer::new(self.config.delay_between_requests),
            max_pages: self.config.max_pages,
        });

        let mut pool = JoinSet::new();
        for id in 0..workers {
            let worker = Worker {
                id,
                config: Arc::clone(&self.config),
                fetcher: Arc::clone(&self.fetcher),
                extractor: Arc::clone(&self.extractor),
                state: Arc::clone(&state),
            };
            pool.spawn(worker.run());
        }
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "crawl worker died");
            }
        }

        let pages = std::mem::take(&mut *state.pages.lock());
        info!(
            pages = pages.len(),
            claimed = state.visited.len(),
            failures = state.failures.load(Ordering::Relaxed),
            skipped = state.skipped.load(Ordering::Relaxed),
            "crawl finished"
        );
        Ok(pages)
    }
}

struct Worker<F, E> {
    id: usize,
    config: Arc<CrawlConfig>,
    fetcher: Arc<F>,
    extractor: Arc<E>,
    state: Arc<CrawlState>,
}

impl<F: Fetcher, E: PageExtractor> Worker<F, E> {
    async fn run(self) {
        loop {
            if self.state.limit_reached() {
                break;
            }
            let Some(entry) = self.state.frontier.next().await else { break };
            let mut in_flight = InFlight { frontier: &self.state.frontier, links: Vec::new() };

            if self.state.limit_reached() || entry.depth > self.config.max_depth {
                continue;
            }
            if !self.state.visited.insert(entry.url.as_str().to_string()) {
                continue;
            }

            match self.visit(&entry).await {
                Ok(links) => in_flight.links = links,
                Err(err) if err.is_fetch_error() => {
                    self.state.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(worker = self.id, url = %entry.url, depth = entry.depth, error = %err, "fetch failed");
                }
                Err(err) => {
                    self.state.skipped.fetch_add(1, Ordering::Relaxed);
                    debug!(worker = self.id, url = %entry.url, error = %err, "page skipped");
                }
            }
        }
        debug!(worker = self.id, "worker exiting");
    }

    /// Fetch and extract one claimed URL; returns the links to enqueue.
    async fn visit(&self, entry: &FrontierEntry) -> Result<Vec<FrontierEntry>, CrawlError> {
        let html = {
            // the semaphore is never closed
            let Ok(_permit) = self.state.permits.acquire().await else { return Ok(Vec::new()) };
            self.state.pacer.wait_turn().await;
            debug!(worker = self.id, url = %entry.url, depth = entry.depth, "fetching");
            self.fetcher.fetch(&entry.url).await?
        };

        let extracted = self.extractor.extract(&html, &entry.url);
        let length = extracted.content.chars().count();
        if length < self.config.min_content_length {
            return Err(CrawlError::ThinContent { url: entry.url.to_string(), length });
        }

        let title = if extracted.title.trim().is_empty() {
            fallback_title(&entry.url)
        } else {
            extracted.title
        };
        let page = WebPage {
            url: entry.url.to_string(),
            title,
            content: extracted.content,
            meta_description: extracted.meta_description,
            keywords: extracted.keywords,
            headings: extracted.headings,
            content_length: length,
            fetched_at: OffsetDateTime::now_utc(),
        };

        let Some(processed) = self.state.try_record(page) else {
            debug!(url = %entry.url, "page limit reached, discarding");
            return Ok(Vec::new());
        };
        if processed % PROGRESS_EVERY == 0 {
            info!(worker = self.id, processed, "crawl progress");
        }

        if entry.depth >= self.config.max_depth {
            return Ok(Vec::new());
        }
        let depth = entry.depth + 1;
        Ok(extracted
            .links
            .into_iter()
            .filter(|link| self.config.check_url(link).is_ok())
            // advisory only; the claim in run() is authoritative
            .filter(|link| !self.state.visited.contains(link.as_str()))
            .map(|url| FrontierEntry { url, depth })
            .collect())
    }
}

/// Last non-empty path segment, or "Untitled".
fn fallback_title(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .unwrap_or_else(|| "Untitled".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_title_uses_last_segment() {
        assert_eq!(fallback_title(&Url::parse("https://a.test/docs/intro.html").unwrap()), "intro.html");
        assert_eq!(fallback_title(&Url::parse("https://a.test/docs/").unwrap()), "docs");
        assert_eq!(fallback_title(&Url::parse("https://a.test/").unwrap()), "Untitled");
    }

    #[tokio::test]
    async fn frontier_drains_then_reports_done() {
        let seed = FrontierEntry { url: Url::parse("https://a.test/").unwrap(), depth: 0 };
        let frontier = Frontier::new(vec![seed.clone()]);
        let first = frontier.next().await;
        assert_eq!(first, Some(seed));
        let child = FrontierEntry { url: Url::parse("https://a.test/child").unwrap(), depth: 1 };
        frontier.finish(vec![child.clone()]);
        assert_eq!(frontier.next().await, Some(child));
        frontier.finish(Vec::new());
        assert_eq!(frontier.next().await, None);
    }

    #[tokio::test]
    async fn waiting_worker_sees_links_from_in_flight_entry() {
        let frontier = Arc::new(Frontier::new(vec![FrontierEntry {
            url: Url::parse("https://a.test/").unwrap(),
            depth: 0,
        }]));
        assert!(frontier.next().await.is_some());

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished(), "queue empty but one entry in flight");

        let child = FrontierEntry { url: Url::parse("https://a.test/late").unwrap(), depth: 1 };
        frontier.finish(vec![child.clone()]);
        assert_eq!(waiter.await.unwrap(), Some(child));
    }
}
