//! Linkcrawl: a concurrent website link checker
//!
//! This crate crawls a site from one or more start URLs, fetches every
//! reachable resource once, extracts links from HTML pages and builds a
//! consolidated report of every resource's final status together with the
//! pages that referenced it.
//!
//! Fetching happens on a pool of workers that can be OS threads, separate
//! OS processes or cooperative tasks. All crawl state lives in a single
//! [`Site`] owned by the driver loop, so the state machine needs no locks.

pub mod api;
pub mod config;
pub mod crawler;
pub mod output;
pub mod pool;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Failures of individual fetches are never reported through this type;
/// they are recorded as data on [`crawler::FetchResult`] and end up on the
/// finished [`Site`].
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("All workers exited while {outstanding} work items were outstanding")]
    WorkersExited { outstanding: usize },

    #[error("Worker process protocol error: {0}")]
    Ipc(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),

    #[error("This type is not supported: {0}")]
    UnsupportedElementKind(String),
}

/// URL-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("The URL must not be empty")]
    Empty,

    #[error("Failed to parse URL: {0}")]
    Parse(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::{Config, CrawlPolicy, Mode};
pub use crawler::{crawl, Crawler};
pub use state::{PageStatus, Site, SitePage, Source};
pub use url::{normalize_url, NormalizedUrl};
