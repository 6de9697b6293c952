use crate::error::{CrawlError, Rejection};
use clap::Args;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "sitesearch-bot/0.1 (+https://example.com/bot)";

/// Default URL blockers: media and office documents, admin and API paths.
pub fn default_exclude_patterns() -> Vec<Regex> {
    [
        r"(?i)\.(jpg|jpeg|png|gif|pdf|doc|docx)$",
        r"/admin/",
        r"/api/",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid exclude pattern"))
    .collect()
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub max_depth: usize,
    pub max_pages: usize,
    /// Minimum spacing between any two fetches across the whole pool.
    pub delay_between_requests: Duration,
    /// Worker count, and the number of fetch permits.
    pub max_concurrent_requests: usize,
    pub user_agent: String,
    /// Sent verbatim as the `Cookie` header.
    pub cookie: Option<String>,
    /// Carried for callers; robots.txt is not consulted.
    pub respect_robots_txt: bool,
    /// Empty means any host.
    pub allowed_domains: HashSet<String>,
    pub exclude_patterns: Vec<Regex>,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
    /// Pages with less extracted text than this are dropped.
    pub min_content_length: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 1000,
            delay_between_requests: Duration::from_millis(100),
            max_concurrent_requests: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie: None,
            respect_robots_txt: true,
            allowed_domains: HashSet::new(),
            exclude_patterns: default_exclude_patterns(),
            request_timeout: Duration::from_secs(15),
            max_body_bytes: 2 * 1024 * 1024,
            min_content_length: 100,
        }
    }
}

impl CrawlConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self { self.max_depth = max_depth; self }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self { self.max_pages = max_pages; self }

    pub fn with_delay(mut self, delay: Duration) -> Self { self.delay_between_requests = delay; self }

    pub fn with_concurrency(mut self, n: usize) -> Self { self.max_concurrent_requests = n.max(1); self }

    pub fn with_cookie(mut self, cookie: Option<String>) -> Self { self.cookie = cookie; self }

    pub fn with_min_content_length(mut self, n: usize) -> Self { self.min_content_length = n; self }

    pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict the crawl to the seed hosts, with and without a `www.` prefix.
    /// Seeds that do not parse are ignored here and reported by the crawl.
    pub fn with_seed_domains<S: AsRef<str>>(mut self, seeds: &[S]) -> Self {
        let mut domains = HashSet::new();
        for seed in seeds {
            let Ok(url) = Url::parse(seed.as_ref().trim()) else { continue };
            let Some(host) = url.host_str() else { continue };
            domains.insert(host.to_string());
            match host.strip_prefix("www.") {
                Some(bare) => domains.insert(bare.to_string()),
                None => domains.insert(format!("www.{host}")),
            };
        }
        self.allowed_domains = domains;
        self
    }

    /// Scheme, domain and exclude-pattern check applied to seeds and links.
    pub fn check_url(&self, url: &Url) -> Result<(), Rejection> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Rejection::UnsupportedScheme(url.scheme().to_string()));
        }
        let host = url.host_str().ok_or(Rejection::MissingHost)?;
        if !self.allowed_domains.is_empty() && !self.allowed_domains.contains(host) {
            return Err(Rejection::DomainNotAllowed(host.to_string()));
        }
        if let Some(p) = self.exclude_patterns.iter().find(|p| p.is_match(url.as_str())) {
            return Err(Rejection::Excluded(p.as_str().to_string()));
        }
        Ok(())
    }

    /// Parse a seed, drop its fragment and run it through the filter.
    pub fn seed_url(&self, raw: &str) -> Result<Url, CrawlError> {
        let raw = raw.trim();
        let mut url = Url::parse(raw).map_err(|source| CrawlError::InvalidSeed { url: raw.to_string(), source })?;
        url.set_fragment(None);
        self.check_url(&url).map_err(|reason| CrawlError::Rejected { url: url.to_string(), reason })?;
        Ok(url)
    }

    pub fn is_allowed_url(&self, url: &str) -> bool {
        Url::parse(url).map(|u| self.check_url(&u).is_ok()).unwrap_or(false)
    }
}

/// Crawl options shared by the command-line tools.
#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Maximum link depth from a seed
    #[arg(long, default_value_t = 2)]
    pub max_depth: usize,
    /// Maximum pages to keep
    #[arg(long, default_value_t = 100)]
    pub max_pages: usize,
    /// Minimum delay between requests, in milliseconds
    #[arg(long = "delay", default_value_t = 200)]
    pub delay_ms: u64,
    /// Concurrent workers
    #[arg(long = "concurrent", default_value_t = 5)]
    pub concurrency: usize,
    /// Allowed domains (comma-separated); defaults to the seed hosts
    #[arg(long, value_delimiter = ',')]
    pub domains: Vec<String>,
    /// User-Agent header
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
    /// Cookie header; falls back to $AUTH_COOKIE
    #[arg(long)]
    pub cookie: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,
}

impl CrawlArgs {
    pub fn into_config<S: AsRef<str>>(self, seeds: &[S]) -> CrawlConfig {
        let cookie = self
            .cookie
            .or_else(|| std::env::var("AUTH_COOKIE").ok())
            .filter(|c| !c.trim().is_empty());
        let mut config = CrawlConfig {
            user_agent: self.user_agent,
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..CrawlConfig::default()
        }
        .with_max_depth(self.max_depth)
        .with_max_pages(self.max_pages)
        .with_delay(Duration::from_millis(self.delay_ms))
        .with_concurrency(self.concurrency)
        .with_cookie(cookie);
        let domains: Vec<String> =
            self.domains.iter().map(|d| d.trim().to_string()).filter(|d| !d.is_empty()).collect();
        config = if domains.is_empty() {
            config.with_seed_domains(seeds)
        } else {
            config.with_allowed_domains(domains)
        };
        config
    }
}
