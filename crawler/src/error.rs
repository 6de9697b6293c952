use std::fmt;
use thiserror::Error;

/// Why a URL was refused by the crawl filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("url has no host")]
    MissingHost,

    #[error("host {0} is not in the allowed domains")]
    DomainNotAllowed(String),

    #[error("matches exclude pattern {0}")]
    Excluded(String),
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid seed url {url:?}: {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid crawl configuration: {0}")]
    Config(String),

    #[error("{url} rejected: {reason}")]
    Rejected { url: String, reason: Rejection },

    #[error("fetching {url} failed: {message}")]
    Fetch { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not HTML (content-type {content_type})")]
    NotHtml { url: String, content_type: String },

    #[error("{url} body exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    #[error("{url} has too little text ({length} chars)")]
    ThinContent { url: String, length: usize },
}

impl CrawlError {
    pub fn fetch(url: impl fmt::Display, err: impl fmt::Display) -> Self {
        CrawlError::Fetch { url: url.to_string(), message: err.to_string() }
    }

    /// Network, status, content-type and size failures.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            CrawlError::Fetch { .. }
                | CrawlError::Status { .. }
                | CrawlError::NotHtml { .. }
                | CrawlError::BodyTooLarge { .. }
        )
    }
}
