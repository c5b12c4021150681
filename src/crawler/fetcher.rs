//! HTTP fetcher implementation
//!
//! This module performs exactly one GET per work item and maps every
//! possible outcome onto a closed set of cases:
//! - building HTTP clients with the configured timeout and user agent
//! - following redirects and reporting the final URL
//! - classifying HTTP errors, timeouts and other transport failures
//!
//! Nothing here returns `Err` for a failed fetch; failures are data.

use crate::crawler::types::{FetchException, FetchResult};
use crate::url::NormalizedUrl;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Response};
use std::error::Error as StdError;
use std::time::Duration;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("linkcrawl/", env!("CARGO_PKG_VERSION"));

/// Longest redirect chain followed before giving up
const MAX_REDIRECTS: usize = 10;

/// HTTP basic authentication credentials
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

/// A successful response whose body has not been read yet
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: NormalizedUrl,
    /// HTTP status code (2xx or an unfollowed 3xx)
    pub status: u16,
    /// Whether the final URL differs from the requested one
    pub is_redirect: bool,
    /// Whether the Content-Type announces HTML
    pub is_html: bool,
    response: Response,
}

impl FetchedPage {
    /// Reads the whole body as text
    pub async fn text(self) -> Result<String, reqwest::Error> {
        self.response.text().await
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum Fetched {
    /// The server answered with a non-error status
    Success(FetchedPage),

    /// The server answered with a 4xx or 5xx status
    HttpError {
        /// The HTTP status code
        status: u16,
    },

    /// The request or the body read exceeded the timeout
    Timeout,

    /// Any other transport or protocol failure
    Exception(FetchException),
}

impl Fetched {
    /// Classifies a reqwest error
    pub fn from_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }
        Self::Exception(FetchException::new(
            error_kind(error),
            error_message(error),
        ))
    }

    /// Converts a non-success outcome into its result record
    ///
    /// Successes need link extraction first and are assembled by the page
    /// worker; passing one here records it without links.
    pub fn into_result(self, original_url: NormalizedUrl) -> FetchResult {
        match self {
            Self::HttpError { status } => FetchResult::http_error(original_url, status),
            Self::Timeout => FetchResult::timeout(original_url),
            Self::Exception(exception) => FetchResult::exception(original_url, exception),
            Self::Success(page) => FetchResult {
                original_url,
                final_url: Some(page.final_url),
                status: Some(page.status),
                is_timeout: false,
                is_redirect: page.is_redirect,
                links: Vec::new(),
                exception: None,
                is_html: page.is_html,
            },
        }
    }
}

/// Builds an HTTP client with the given per-request timeout
///
/// # Example
///
/// ```
/// use linkcrawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches URLs and classifies the outcome
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    credentials: Option<Credentials>,
}

impl Fetcher {
    pub fn new(timeout: Duration, credentials: Option<Credentials>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(timeout)?,
            credentials,
        })
    }

    /// Performs one GET request
    ///
    /// # Outcomes
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Timeout (connect, headers or body) | `Timeout` |
    /// | HTTP 4xx / 5xx | `HttpError` with the status |
    /// | DNS failure, refused connection, redirect loop, ... | `Exception` |
    /// | Anything else | `Success` with final URL and redirect flag |
    ///
    /// The fragment is never sent; it does not count as a redirect when the
    /// final URL lacks it.
    pub async fn fetch(&self, url: &NormalizedUrl) -> Fetched {
        let requested = url.without_fragment();
        let target = match requested.to_url() {
            Ok(target) => target,
            Err(e) => return Fetched::Exception(FetchException::new("InvalidUrl", e.to_string())),
        };

        let mut request = self.client.get(target);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, credentials.password.as_ref());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Fetched::from_error(&e),
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Fetched::HttpError {
                status: status.as_u16(),
            };
        }

        let final_url = match NormalizedUrl::from_url(response.url()) {
            Ok(final_url) => final_url,
            Err(e) => return Fetched::Exception(FetchException::new("InvalidUrl", e.to_string())),
        };

        Fetched::Success(FetchedPage {
            is_redirect: final_url != requested,
            is_html: is_html(response.headers()),
            status: status.as_u16(),
            final_url,
            response,
        })
    }
}

/// Checks whether the Content-Type header announces an HTML document
fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let mime = v.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            mime == "text/html" || mime == "application/xhtml+xml"
        })
        .unwrap_or(false)
}

fn error_kind(error: &reqwest::Error) -> &'static str {
    if error.is_connect() {
        "ConnectError"
    } else if error.is_redirect() {
        "RedirectError"
    } else if error.is_decode() {
        "DecodeError"
    } else if error.is_body() {
        "BodyError"
    } else if error.is_builder() {
        "BuilderError"
    } else if error.is_request() {
        "RequestError"
    } else {
        "HttpClientError"
    }
}

/// Flattens an error and its sources into one line
fn error_message(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
