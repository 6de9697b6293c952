pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pacing;

pub use config::{CrawlArgs, CrawlConfig};
pub use engine::{Crawler, FrontierEntry};
pub use error::{CrawlError, Rejection};
pub use extract::{ExtractedPage, HtmlExtractor, PageExtractor};
pub use fetch::{Fetcher, HttpFetcher};
