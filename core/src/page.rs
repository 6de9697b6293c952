use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A crawled page. Identity is `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebPage {
    pub url: String,
    pub title: String,
    /// Plain text with markup removed.
    pub content: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub headings: Vec<String>,
    /// Length of `content` in characters.
    pub content_length: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub fetched_at: OffsetDateTime,
}

impl WebPage {
    /// Page with only the required fields set, fetched now.
    pub fn new(url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            url: url.into(),
            title: title.into(),
            content_length: content.chars().count(),
            content,
            meta_description: String::new(),
            keywords: Vec::new(),
            headings: Vec::new(),
            fetched_at: OffsetDateTime::now_utc(),
        }
    }
}
