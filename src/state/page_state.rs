/// Page state definitions for tracking crawl progress
///
/// This module defines the per-URL bookkeeping kept by the frontier and the
/// finalized record produced once a URL has been crawled.
use crate::crawler::{FetchException, FetchResult};
use crate::url::NormalizedUrl;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A page that references a resource, with the markup that did it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// The referring page
    pub origin: NormalizedUrl,

    /// The referring element's markup
    pub snippet: String,
}

/// Frontier state of a URL that has been seen
///
/// Unseen URLs have no entry at all. The transition is always
/// unseen → `Queued` → `Crawled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    /// A work item was issued; sources accumulate until the result arrives
    Queued { sources: Vec<Source> },

    /// The result arrived; the finalized record lives under `page`
    ///
    /// `page` differs from the URL itself when the fetch was redirected.
    Crawled { page: NormalizedUrl },
}

impl PageStatus {
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }

    pub fn is_crawled(&self) -> bool {
        matches!(self, Self::Crawled { .. })
    }
}

/// Finalized crawl result for one final URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePage {
    /// Final URL (after redirects) of the resource
    pub url: NormalizedUrl,

    /// HTTP status code, absent for timeouts and exceptions
    pub status: Option<u16>,

    pub is_timeout: bool,

    pub exception: Option<FetchException>,

    pub is_html: bool,

    /// Whether the URL belongs to the crawled site
    pub is_local: bool,

    /// Every reference to this resource; only ever extended
    pub sources: Vec<Source>,
}

impl SitePage {
    /// Builds the record for the first result resolving to `url`
    pub fn from_result(
        url: NormalizedUrl,
        result: &FetchResult,
        is_local: bool,
        sources: Vec<Source>,
    ) -> Self {
        Self {
            url,
            status: result.status,
            is_timeout: result.is_timeout,
            exception: result.exception.clone(),
            is_html: result.is_html,
            is_local,
            sources,
        }
    }

    pub fn add_sources(&mut self, sources: impl IntoIterator<Item = Source>) {
        self.sources.extend(sources);
    }

    /// Returns true for HTTP errors (status >= 400), timeouts and exceptions
    pub fn is_error(&self) -> bool {
        self.is_timeout || self.exception.is_some() || self.status.is_some_and(|s| s >= 400)
    }

    pub fn is_ok(&self) -> bool {
        !self.is_error()
    }

    /// Short human-readable status, e.g. `ok (200)` or `error (timeout)`
    pub fn status_message(&self) -> String {
        if self.is_timeout {
            "error (timeout)".to_string()
        } else if let Some(exception) = &self.exception {
            format!("error ({})", exception)
        } else {
            match self.status {
                Some(status) if status >= 400 => format!("error ({})", status),
                Some(status) => format!("ok ({})", status),
                None => "ok".to_string(),
            }
        }
    }
}

impl fmt::Display for SitePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, self.status_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::normalize_url;

    fn page(status: Option<u16>) -> SitePage {
        SitePage {
            url: normalize_url("http://example.com/").unwrap(),
            status,
            is_timeout: false,
            exception: None,
            is_html: true,
            is_local: true,
            sources: vec![],
        }
    }

    #[test]
    fn test_status_classification() {
        assert!(page(Some(200)).is_ok());
        assert!(page(Some(301)).is_ok());
        assert!(page(Some(404)).is_error());
        assert!(page(Some(500)).is_error());
    }

    #[test]
    fn test_timeout_and_exception_are_errors() {
        let mut timed_out = page(None);
        timed_out.is_timeout = true;
        assert!(timed_out.is_error());
        assert_eq!(timed_out.status_message(), "error (timeout)");

        let mut failed = page(None);
        failed.exception = Some(FetchException::new("ConnectError", "refused"));
        assert!(failed.is_error());
        assert_eq!(failed.status_message(), "error (ConnectError: refused)");
    }

    #[test]
    fn test_display() {
        assert_eq!(page(Some(200)).to_string(), "http://example.com/: ok (200)");
        assert_eq!(page(Some(404)).to_string(), "http://example.com/: error (404)");
    }

    #[test]
    fn test_page_status_predicates() {
        let queued = PageStatus::Queued { sources: vec![] };
        assert!(queued.is_queued());
        assert!(!queued.is_crawled());

        let crawled = PageStatus::Crawled {
            page: normalize_url("http://example.com/").unwrap(),
        };
        assert!(crawled.is_crawled());
    }
}
