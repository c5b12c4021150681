//! Plain value records exchanged between the driver and the workers
//!
//! Everything here must survive a trip through a worker process pipe, so
//! the records own all of their data and carry no behavior beyond small
//! constructors.

use crate::crawler::parser::ElementKind;
use crate::url::NormalizedUrl;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One fetch request routed to a worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// The URL to fetch
    pub url: NormalizedUrl,

    /// Whether links should be extracted from the page
    pub should_expand: bool,
}

/// A message on the work queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkMessage {
    /// Fetch this item and report back
    Crawl(WorkItem),

    /// No more work; the receiving worker terminates
    Done,
}

/// A transport or protocol failure, reduced to strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchException {
    /// Short name of the failure class, e.g. `ConnectError`
    pub kind: String,

    /// Human-readable description
    pub message: String,
}

impl FetchException {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// One reference discovered on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Element the reference came from
    pub kind: ElementKind,

    /// Resolved absolute target
    pub url: NormalizedUrl,

    /// The page the reference was found on
    pub origin: NormalizedUrl,

    /// The source markup of the element
    pub snippet: String,
}

/// Outcome of one fetch (and optional parse) attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    /// The URL the work item asked for
    pub original_url: NormalizedUrl,

    /// The URL the response came from after redirects (successes only)
    pub final_url: Option<NormalizedUrl>,

    /// HTTP status code, absent for timeouts and exceptions
    pub status: Option<u16>,

    pub is_timeout: bool,

    pub is_redirect: bool,

    /// Links extracted from the page (empty unless expanded)
    pub links: Vec<Link>,

    pub exception: Option<FetchException>,

    pub is_html: bool,
}

impl FetchResult {
    fn empty(original_url: NormalizedUrl) -> Self {
        Self {
            original_url,
            final_url: None,
            status: None,
            is_timeout: false,
            is_redirect: false,
            links: Vec::new(),
            exception: None,
            is_html: false,
        }
    }

    /// The server answered with an error status
    pub fn http_error(original_url: NormalizedUrl, status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::empty(original_url)
        }
    }

    /// The fetch exceeded its time budget
    pub fn timeout(original_url: NormalizedUrl) -> Self {
        Self {
            is_timeout: true,
            ..Self::empty(original_url)
        }
    }

    /// Any other failure
    pub fn exception(original_url: NormalizedUrl, exception: FetchException) -> Self {
        Self {
            exception: Some(exception),
            ..Self::empty(original_url)
        }
    }
}
