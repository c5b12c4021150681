//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic:
//! - HTTP fetching and outcome classification
//! - HTML parsing and link extraction
//! - The page worker run by every pool backend
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod types;
mod worker;

pub use coordinator::{crawl, Crawler};
pub use fetcher::{build_http_client, Credentials, Fetched, FetchedPage, Fetcher, USER_AGENT};
pub use parser::{extract_links, parse_element_kinds, parse_html, ElementKind};
pub use types::{FetchException, FetchResult, Link, WorkItem, WorkMessage};
pub use worker::{PageWorker, WorkerConfig};
