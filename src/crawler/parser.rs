//! HTML link extraction
//!
//! This module turns a parsed HTML document into [`Link`] records:
//! - honors an explicit `<base href>` as the resolution base
//! - reads the link-bearing attribute of each configured element kind
//! - resolves every reference to an absolute, normalized URL

use crate::crawler::types::Link;
use crate::url::NormalizedUrl;
use crate::ConfigError;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix of embedded (inline) resources
const DATA_SRC: &str = "data:";

/// Element kinds whose references can be followed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    #[serde(rename = "a")]
    Anchor,
    #[serde(rename = "img")]
    Image,
    #[serde(rename = "script")]
    Script,
    #[serde(rename = "link")]
    Stylesheet,
}

impl ElementKind {
    /// All supported kinds, in the default extraction order
    pub const ALL: [ElementKind; 4] = [
        ElementKind::Anchor,
        ElementKind::Image,
        ElementKind::Script,
        ElementKind::Stylesheet,
    ];

    /// The HTML tag name
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Anchor => "a",
            Self::Image => "img",
            Self::Script => "script",
            Self::Stylesheet => "link",
        }
    }

    /// The attribute holding the reference
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::Anchor | Self::Stylesheet => "href",
            Self::Image | Self::Script => "src",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ElementKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == s.trim())
            .ok_or_else(|| ConfigError::UnsupportedElementKind(s.to_string()))
    }
}

/// Parses a list of tag names into element kinds
///
/// Fails on the first unsupported name, so a bad configuration is rejected
/// before any page is fetched.
pub fn parse_element_kinds<S: AsRef<str>>(names: &[S]) -> Result<Vec<ElementKind>, ConfigError> {
    let mut kinds = Vec::with_capacity(names.len());
    for name in names {
        let kind: ElementKind = name.as_ref().parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

/// Parses HTML content and extracts the links of the given kinds
///
/// # Example
///
/// ```
/// use linkcrawl::crawler::{parse_html, ElementKind};
/// use linkcrawl::url::normalize_url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let page = normalize_url("https://example.com/").unwrap();
/// let links = parse_html(html, &page, &[ElementKind::Anchor]);
/// assert_eq!(links[0].url.to_string(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, page_url: &NormalizedUrl, kinds: &[ElementKind]) -> Vec<Link> {
    let document = Html::parse_document(html);
    extract_links(&document, page_url, kinds)
}

/// Extracts links from an already parsed document
///
/// Relative references resolve against `page_url`, or against the first
/// `<base href>` of the document when there is one.
pub fn extract_links(
    document: &Html,
    page_url: &NormalizedUrl,
    kinds: &[ElementKind],
) -> Vec<Link> {
    let base_url = find_base_url(document, page_url);
    let mut links = Vec::new();

    for kind in kinds {
        let Ok(selector) = Selector::parse(kind.tag()) else {
            continue;
        };

        for element in document.select(&selector) {
            let Some(reference) = element.value().attr(kind.attribute()) else {
                continue;
            };

            if let Some(url) = resolve_link(reference, &base_url) {
                links.push(Link {
                    kind: *kind,
                    url,
                    origin: page_url.clone(),
                    snippet: element.html(),
                });
            }
        }
    }

    links
}

/// Returns the document's `<base href>` resolved against the page URL
fn find_base_url(document: &Html, page_url: &NormalizedUrl) -> NormalizedUrl {
    let Ok(selector) = Selector::parse("base[href]") else {
        return page_url.clone();
    };

    document
        .select(&selector)
        .next()
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Resolves a reference to an absolute URL
///
/// Returns None if the reference should be skipped:
/// - empty references
/// - fragment-only references (same page anchors)
/// - `data:` URIs
/// - anything that does not resolve to an HTTP(S) URL (`mailto:`,
///   `javascript:`, `tel:`, ...)
fn resolve_link(reference: &str, base_url: &NormalizedUrl) -> Option<NormalizedUrl> {
    let reference = reference.trim();

    if reference.is_empty() || reference.starts_with('#') || reference.starts_with(DATA_SRC) {
        return None;
    }

    match base_url.join(reference) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        _ => None,
    }
}
