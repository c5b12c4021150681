//! The frontier: authoritative state of the whole crawl
//!
//! [`Site`] is mutated only by the driver loop, one result at a time. It
//! decides which discoveries become new work and consolidates redirect
//! chains so a final URL is recorded exactly once.

use crate::config::CrawlPolicy;
use crate::crawler::{FetchResult, Link, WorkItem};
use crate::state::page_state::{PageStatus, SitePage, Source};
use crate::url::NormalizedUrl;
use std::collections::HashMap;

/// Crawl state of a site
#[derive(Debug, Clone)]
pub struct Site {
    policy: CrawlPolicy,

    start_urls: Vec<NormalizedUrl>,

    /// Every URL seen so far, queued or crawled
    page_statuses: HashMap<NormalizedUrl, PageStatus>,

    /// Finalized records keyed by final URL
    pages: HashMap<NormalizedUrl, SitePage>,
}

impl Site {
    pub fn new(policy: CrawlPolicy) -> Self {
        Self {
            policy,
            start_urls: Vec::new(),
            page_statuses: HashMap::new(),
            pages: HashMap::new(),
        }
    }

    /// Queues the start URLs and returns their work items
    ///
    /// Start URLs already seen are not queued again.
    pub fn seed(&mut self, urls: &[NormalizedUrl]) -> Vec<WorkItem> {
        let mut work_items = Vec::new();

        for url in urls {
            if !self.start_urls.contains(url) {
                self.start_urls.push(url.clone());
            }

            if self.page_statuses.contains_key(url) {
                continue;
            }

            self.page_statuses
                .insert(url.clone(), PageStatus::Queued { sources: Vec::new() });
            work_items.push(WorkItem {
                url: url.clone(),
                should_expand: self.policy.is_local(url),
            });
        }

        work_items
    }

    /// Applies one fetch result and returns the newly discovered work
    ///
    /// 1. Drop the result if its URL is not queued
    /// 2. Mark the URL crawled
    /// 3. Merge into an existing page for the same final URL, or
    /// 4. create that page
    /// 5. Run the download policy over the extracted links
    pub fn add_crawled_page(&mut self, result: FetchResult) -> Vec<WorkItem> {
        let original_url = result.original_url.clone();

        let sources = match self.page_statuses.get_mut(&original_url) {
            Some(PageStatus::Queued { sources }) => std::mem::take(sources),
            _ => {
                tracing::warn!("Dropping result for {}: not queued", original_url);
                return Vec::new();
            }
        };

        let final_url = result
            .final_url
            .clone()
            .unwrap_or_else(|| original_url.clone());

        self.page_statuses.insert(
            original_url.clone(),
            PageStatus::Crawled {
                page: final_url.clone(),
            },
        );

        if final_url != original_url {
            // a queued final URL stays queued: its own result is still owed
            // to the driver, and merges its sources into this page on arrival
            self.page_statuses
                .entry(final_url.clone())
                .or_insert_with(|| PageStatus::Crawled {
                    page: final_url.clone(),
                });
        }

        if let Some(page) = self.pages.get_mut(&final_url) {
            tracing::debug!(
                "{} resolved to already crawled {}, merging sources",
                original_url,
                final_url
            );
            page.add_sources(sources);
            return Vec::new();
        }

        let is_local = self.policy.is_local(&final_url);
        let page = SitePage::from_result(final_url.clone(), &result, is_local, sources);
        tracing::debug!("{}", page);
        self.pages.insert(final_url, page);

        self.process_links(result.links)
    }

    fn process_links(&mut self, links: Vec<Link>) -> Vec<WorkItem> {
        let mut work_items = Vec::new();

        for link in links {
            if !self.policy.should_download(&link.url) {
                continue;
            }

            let source = Source {
                origin: link.origin,
                snippet: link.snippet,
            };

            match self.page_statuses.get_mut(&link.url) {
                Some(PageStatus::Queued { sources }) => sources.push(source),
                Some(PageStatus::Crawled { page }) => {
                    if let Some(site_page) = self.pages.get_mut(page) {
                        site_page.add_sources([source]);
                    }
                }
                None => {
                    work_items.push(WorkItem {
                        url: link.url.clone(),
                        should_expand: self.policy.is_local(&link.url),
                    });
                    self.page_statuses.insert(
                        link.url,
                        PageStatus::Queued {
                            sources: vec![source],
                        },
                    );
                }
            }
        }

        work_items
    }

    /// The start URLs, in seeding order
    pub fn start_urls(&self) -> &[NormalizedUrl] {
        &self.start_urls
    }

    /// All finalized pages keyed by final URL
    pub fn pages(&self) -> &HashMap<NormalizedUrl, SitePage> {
        &self.pages
    }

    /// All finalized pages ordered by URL
    pub fn sorted_pages(&self) -> Vec<&SitePage> {
        let mut pages: Vec<_> = self.pages.values().collect();
        pages.sort_by(|a, b| a.url.cmp(&b.url));
        pages
    }

    /// Pages with an HTTP error status, a timeout or an exception
    pub fn error_pages(&self) -> Vec<&SitePage> {
        self.sorted_pages()
            .into_iter()
            .filter(|page| page.is_error())
            .collect()
    }

    /// True when no page is in error
    pub fn is_ok(&self) -> bool {
        self.pages.values().all(SitePage::is_ok)
    }

    pub fn page_status(&self, url: &NormalizedUrl) -> Option<&PageStatus> {
        self.page_statuses.get(url)
    }

    /// Number of URLs still waiting for a result
    pub fn queued_count(&self) -> usize {
        self.page_statuses
            .values()
            .filter(|status| status.is_queued())
            .count()
    }
}
