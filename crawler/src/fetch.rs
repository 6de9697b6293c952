use crate::config::CrawlConfig;
use crate::error::CrawlError;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect, Client};
use url::Url;

/// Source of raw HTML for the crawl engine.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, CrawlError>;
}

/// reqwest-backed fetcher honouring the configured user agent, cookie and timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, CrawlError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| CrawlError::Config(format!("invalid cookie header: {e}")))?;
            headers.insert(header::COOKIE, value);
        }
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(redirect::Policy::limited(5))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CrawlError::Config(format!("http client: {e}")))?;
        Ok(Self { client, max_body_bytes: config.max_body_bytes })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, CrawlError> {
        let resp = self.client.get(url.clone()).send().await.map_err(|e| CrawlError::fetch(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CrawlError::Status { url: url.to_string(), status: status.as_u16() });
        }
        if let Some(ct) = resp.headers().get(header::CONTENT_TYPE) {
            let ct = ct.to_str().unwrap_or_default().to_ascii_lowercase();
            if !ct.contains("text/html") {
                return Err(CrawlError::NotHtml { url: url.to_string(), content_type: ct });
            }
        }
        let too_large = || CrawlError::BodyTooLarge { url: url.to_string(), limit: self.max_body_bytes };
        if resp.content_length().is_some_and(|len| len > self.max_body_bytes as u64) {
            return Err(too_large());
        }

        let bytes = resp.bytes().await.map_err(|e| CrawlError::fetch(url, e))?;
        if bytes.len() > self.max_body_bytes {
            return Err(too_large());
        }
        tracing::debug!(%url, bytes = bytes.len(), "fetched");
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
