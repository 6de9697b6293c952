use crate::snippet::{build_snippet, count_matches, query_terms};
use crate::stats::{MemorySnapshot, SiteStats};
use crawler::{CrawlConfig, CrawlError, Crawler};
use search_core::{Document, InvertedIndex, WebPage};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, warn};

/// A ranked hit with the page it came from.
#[derive(Debug, Clone, Serialize)]
pub struct WebSearchResult {
    pub page: WebPage,
    pub score: f64,
    pub matched_terms: BTreeSet<String>,
    pub corrections: BTreeMap<String, String>,
    pub snippet: String,
    pub match_count: usize,
}

/// Crawled pages plus the inverted index built from them.
#[derive(Debug, Default)]
pub struct SiteSearch {
    index: InvertedIndex,
    pages: HashMap<String, WebPage>,
}

impl SiteSearch {
    pub fn new() -> Self { Self::default() }

    /// Index `pages` under their URLs. Returns how many were submitted.
    pub fn index_pages(&mut self, pages: impl IntoIterator<Item = WebPage>) -> usize {
        let mut count = 0;
        for page in pages {
            self.index.add_document(Document {
                id: page.url.clone(),
                title: page.title.clone(),
                content: enriched_content(&page),
            });
            self.pages.insert(page.url.clone(), page);
            count += 1;
        }
        let stats = self.index.stats();
        info!(
            pages = count,
            total_documents = stats.total_documents,
            total_terms = stats.total_terms,
            "indexed pages"
        );
        count
    }

    /// Crawl `seeds` over HTTP and index whatever the crawl kept.
    pub async fn index_website<S: AsRef<str>>(&mut self, seeds: &[S], config: CrawlConfig) -> Result<usize, CrawlError> {
        let pages = Crawler::http(config)?.crawl(seeds).await?;
        if pages.is_empty() {
            warn!(seeds = seeds.len(), "crawl produced no pages; nothing to index");
            return Ok(0);
        }
        let count = self.index_pages(pages);
        let stats = self.stats();
        info!(
            indexed_pages = stats.indexed_pages,
            total_terms = stats.total_terms,
            average_page_size = stats.average_page_size,
            "website indexed"
        );
        Ok(count)
    }

    pub fn search(&self, query: &str, max_results: usize, fuzzy: bool) -> Vec<WebSearchResult> {
        let terms = query_terms(query);
        self.index
            .search(query, max_results, fuzzy)
            .into_iter()
            .filter_map(|hit| {
                let page = self.pages.get(&hit.id)?;
                Some(WebSearchResult {
                    snippet: build_snippet(&page.content, &terms),
                    match_count: count_matches(&page.title, &page.content, &terms),
                    page: page.clone(),
                    score: hit.score,
                    matched_terms: hit.matched_terms,
                    corrections: hit.corrections,
                })
            })
            .collect()
    }

    pub fn suggestions(&self, term: &str) -> Vec<String> {
        self.index.suggestions(term)
    }

    pub fn page(&self, url: &str) -> Option<&WebPage> {
        self.pages.get(url)
    }

    pub fn stats(&self) -> SiteStats {
        let index = self.index.stats();
        let total_content_size: usize = self.pages.values().map(|p| p.content_length).sum();
        SiteStats {
            total_documents: index.total_documents,
            total_terms: index.total_terms,
            average_terms_per_document: index.average_terms_per_document,
            indexed_pages: self.pages.len(),
            total_content_size,
            average_page_size: total_content_size.checked_div(self.pages.len()).unwrap_or(0),
            memory: MemorySnapshot::current(),
        }
    }
}

/// Title x3, description x2, each heading and keyword x2, then the body.
fn enriched_content(page: &WebPage) -> String {
    let mut parts: Vec<&str> = vec![page.title.as_str(); 3];
    if !page.meta_description.is_empty() {
        parts.extend([page.meta_description.as_str(); 2]);
    }
    for heading in &page.headings {
        parts.extend([heading.as_str(); 2]);
    }
    for keyword in &page.keywords {
        parts.extend([keyword.as_str(); 2]);
    }
    parts.push(&page.content);
    parts.join(" ")
}
