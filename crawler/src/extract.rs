//! Turning fetched HTML into the fields the index needs.
//!
//! The crawl engine only depends on [`PageExtractor`]; [`HtmlExtractor`] is the
//! html5ever-backed implementation used for real crawls.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedPage {
    pub title: String,
    /// Visible text, whitespace collapsed.
    pub content: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
    pub headings: Vec<String>,
    /// Absolute http(s) links without fragments, in document order.
    pub links: Vec<Url>,
}

/// Best-effort extraction; malformed markup degrades the result instead of failing.
pub trait PageExtractor: Send + Sync {
    fn extract(&self, html: &str, base_url: &Url) -> ExtractedPage;
}

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

pub struct HtmlExtractor {
    title: Selector,
    body: Selector,
    meta: Selector,
    headings: Selector,
    anchors: Selector,
    script_nav: Regex,
}

impl Default for HtmlExtractor {
    fn default() -> Self { Self::new() }
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self {
            title: Selector::parse("title").expect("valid selector"),
            body: Selector::parse("body").expect("valid selector"),
            meta: Selector::parse("meta[name][content]").expect("valid selector"),
            headings: Selector::parse("h1, h2, h3, h4, h5, h6").expect("valid selector"),
            anchors: Selector::parse("a[href]").expect("valid selector"),
            // onclick="location.href='/next'" style navigation
            script_nav: Regex::new(r#"(?i)location\.href\s*=\s*['"]([^'"]+)['"]"#).expect("valid regex"),
        }
    }

    fn meta_content(&self, doc: &Html, name: &str) -> Option<String> {
        doc.select(&self.meta)
            .find(|m| m.value().attr("name").is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .and_then(|m| m.value().attr("content"))
            .map(|c| c.trim().to_string())
    }

    fn links(&self, doc: &Html, html: &str, base: &Url) -> Vec<Url> {
        let hrefs = doc
            .select(&self.anchors)
            .filter_map(|a| a.value().attr("href"))
            .chain(self.script_nav.captures_iter(html).filter_map(|c| c.get(1)).map(|m| m.as_str()));

        let mut seen = HashSet::new();
        hrefs
            .filter_map(|href| resolve_link(base, href))
            .filter(|u| seen.insert(u.as_str().to_string()))
            .collect()
    }
}

impl PageExtractor for HtmlExtractor {
    fn extract(&self, html: &str, base_url: &Url) -> ExtractedPage {
        let doc = Html::parse_document(html);

        let title = doc.select(&self.title).next().map(|t| collapse(t.text())).unwrap_or_default();
        let root = doc.select(&self.body).next().unwrap_or_else(|| doc.root_element());
        let content = visible_text(root);
        let meta_description = self.meta_content(&doc, "description").unwrap_or_default();
        let keywords = self
            .meta_content(&doc, "keywords")
            .map(|k| k.split(',').map(str::trim).filter(|k| !k.is_empty()).map(str::to_string).collect())
            .unwrap_or_default();
        let headings = doc
            .select(&self.headings)
            .map(|h| collapse(h.text()))
            .filter(|h| !h.is_empty())
            .collect();
        let links = self.links(&doc, html, base_url);

        ExtractedPage { title, content, meta_description, keywords, headings, links }
    }
}

/// Resolve `href` against `base`: absolute links pass through, root-relative
/// links keep scheme, host and port, other relative links resolve against the
/// base path. Fragment-only and non-navigational links are dropped.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_ascii_lowercase();
    if ["mailto:", "tel:", "javascript:", "data:"].iter().any(|p| lower.starts_with(p)) {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else { continue };
        let hidden = node.ancestors().any(|a| match a.value() {
            Node::Element(e) => SKIPPED_ELEMENTS.contains(&e.name()),
            _ => false,
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    collapse(std::iter::once(out.as_str()))
}

fn collapse<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in parts.flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
