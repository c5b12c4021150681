//! Page worker: the unit of concurrent work
//!
//! A worker pulls [`WorkMessage`]s, fetches, optionally extracts links and
//! pushes exactly one [`FetchResult`] per work item. It owns no crawl state.

use crate::crawler::fetcher::{Credentials, Fetched, Fetcher};
use crate::crawler::parser::{parse_html, ElementKind};
use crate::crawler::types::{FetchException, FetchResult, WorkItem, WorkMessage};
use crate::pool::panic_message;
use crate::url::NormalizedUrl;
use crate::CrawlError;
use flume::{Receiver, Sender};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

/// Per-worker settings, fixed at spawn time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Per-fetch timeout in seconds
    pub timeout_secs: u64,

    /// Element kinds to extract links from
    pub types: Vec<ElementKind>,

    /// HTTP basic auth credentials, if any
    pub credentials: Option<Credentials>,
}

/// Fetches and parses pages
#[derive(Debug, Clone)]
pub struct PageWorker {
    fetcher: Fetcher,
    types: Vec<ElementKind>,
}

impl PageWorker {
    pub fn new(config: &WorkerConfig) -> Result<Self, CrawlError> {
        let fetcher = Fetcher::new(
            Duration::from_secs(config.timeout_secs),
            config.credentials.clone(),
        )?;

        Ok(Self {
            fetcher,
            types: config.types.clone(),
        })
    }

    /// Runs the worker loop until a `Done` message arrives or either queue
    /// is closed
    pub async fn run(&self, work: Receiver<WorkMessage>, results: Sender<FetchResult>) {
        let worker = self;
        serve_items(work, results, move |item| async move {
            worker.fetch_and_parse(&item).await
        })
        .await;
    }

    /// Crawls one work item
    ///
    /// Never fails: a panic while fetching or parsing is turned into an
    /// exception result so one bad page cannot take the worker down.
    pub async fn crawl_page(&self, item: &WorkItem) -> FetchResult {
        guard(&item.url, self.fetch_and_parse(item)).await
    }

    async fn fetch_and_parse(&self, item: &WorkItem) -> FetchResult {
        tracing::debug!("Fetching {}", item.url);

        let page = match self.fetcher.fetch(&item.url).await {
            Fetched::Success(page) if page.is_html && item.should_expand => page,
            other => return other.into_result(item.url.clone()),
        };

        let final_url = page.final_url.clone();
        let status = page.status;
        let is_redirect = page.is_redirect;

        let body = match page.text().await {
            Ok(body) => body,
            Err(e) => return Fetched::from_error(&e).into_result(item.url.clone()),
        };

        let links = parse_html(&body, &final_url, &self.types);
        tracing::trace!("{} links on {}", links.len(), final_url);

        FetchResult {
            original_url: item.url.clone(),
            final_url: Some(final_url),
            status: Some(status),
            is_timeout: false,
            is_redirect,
            links,
            exception: None,
            is_html: true,
        }
    }
}

/// Pulls items until `Done`, pushing exactly one result per item
async fn serve_items<F, Fut>(work: Receiver<WorkMessage>, results: Sender<FetchResult>, mut crawl: F)
where
    F: FnMut(WorkItem) -> Fut,
    Fut: Future<Output = FetchResult>,
{
    while let Ok(message) = work.recv_async().await {
        let item = match message {
            WorkMessage::Crawl(item) => item,
            WorkMessage::Done => break,
        };

        let url = item.url.clone();
        let result = guard(&url, crawl(item)).await;
        if results.send(result).is_err() {
            tracing::debug!("Result queue closed, worker exiting");
            break;
        }
    }
}

/// Turns a panic inside `fetch` into a `WorkerPanic` exception for `url`
async fn guard<F>(url: &NormalizedUrl, fetch: F) -> FetchResult
where
    F: Future<Output = FetchResult>,
{
    match AssertUnwindSafe(fetch).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!("Worker panicked on {}: {}", url, message);
            FetchResult::exception(url.clone(), FetchException::new("WorkerPanic", message))
        }
    }
}
