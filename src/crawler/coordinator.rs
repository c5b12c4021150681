//! Crawl driver: seeds the frontier, runs the pool and consumes results
//!
//! The driver is the only code that touches the [`Site`]. It keeps an
//! outstanding counter of work items issued but not yet answered:
//! - seeding sets it to the number of seed items
//! - every result decrements it
//! - every newly discovered item increments it
//!
//! The crawl ends when it reaches zero. Only then are the workers told to
//! stop, one `Done` message each.

use crate::config::{validate, Config, CrawlPolicy, Mode};
use crate::crawler::types::{FetchResult, WorkItem, WorkMessage};
use crate::crawler::worker::WorkerConfig;
use crate::pool::{
    build_queues, stop, CooperativePool, ProcessPool, Queues, ThreadPool, WorkerInit, WorkerPool,
};
use crate::state::Site;
use crate::url::{normalize_url, NormalizedUrl};
use crate::{ConfigError, CrawlError};
use flume::{Receiver, Sender};
use tokio::task::LocalSet;

/// Crawl driver
#[derive(Debug, Clone)]
pub struct Crawler {
    config: Config,
    policy: CrawlPolicy,
    worker_config: WorkerConfig,
    start_urls: Vec<NormalizedUrl>,
}

impl Crawler {
    /// Validates the configuration and resolves it for crawling
    ///
    /// Configuration errors (including unsupported element kinds) are
    /// reported here, before any worker starts.
    pub fn new(config: Config) -> crate::Result<Self> {
        validate(&config)?;

        let start_urls = config
            .start_urls
            .iter()
            .map(|u| normalize_url(u))
            .collect::<Result<Vec<_>, _>>()?;
        let policy = CrawlPolicy::from_config(&config)?;
        let worker_config = config.worker_config()?;

        Ok(Self {
            config,
            policy,
            worker_config,
            start_urls,
        })
    }

    /// Runs the crawl to completion and returns the finished site
    ///
    /// The driver runs on a [`LocalSet`] so the cooperative backend can
    /// spawn its tasks next to it.
    pub async fn run(self) -> crate::Result<Site> {
        LocalSet::new().run_until(self.run_pool()).await
    }

    async fn run_pool(self) -> crate::Result<Site> {
        match self.config.performance.mode {
            Mode::Thread => self.crawl_with(ThreadPool::new()).await,
            Mode::Process => {
                let program = self.config.performance.worker_program.clone().ok_or_else(|| {
                    ConfigError::Validation("process mode needs a worker program".to_string())
                })?;
                self.crawl_with(ProcessPool::new(program)).await
            }
            Mode::Green => self.crawl_with(CooperativePool::new()).await,
        }
    }

    async fn crawl_with<P: WorkerPool>(self, pool: P) -> crate::Result<Site> {
        let worker_count = self.config.performance.worker_count();
        let Queues {
            work_tx,
            work_rx,
            results_tx,
            results_rx,
        } = build_queues();

        let mut site = Site::new(self.policy);
        let seeds = site.seed(&self.start_urls);

        tracing::info!(
            "Starting crawl of {} start URL(s) with {} {} worker(s)",
            seeds.len(),
            worker_count,
            pool.name()
        );

        // the workers own the only result senders, so a closed result
        // queue means every worker is gone
        let handles = pool.spawn(
            worker_count,
            WorkerInit {
                config: self.worker_config,
                work: work_rx,
                results: results_tx,
            },
        )?;
        let workers = pool.start(handles)?;

        let outcome = consume(&mut site, seeds, &work_tx, &results_rx).await;

        stop(&work_tx, workers.len());
        for worker in workers {
            worker.join().await;
        }

        outcome?;
        tracing::info!(
            "Crawl finished: {} page(s), {} error(s)",
            site.pages().len(),
            site.error_pages().len()
        );
        Ok(site)
    }
}

/// The result consumption loop
async fn consume(
    site: &mut Site,
    seeds: Vec<WorkItem>,
    work: &Sender<WorkMessage>,
    results: &Receiver<FetchResult>,
) -> crate::Result<()> {
    let mut outstanding = 0;
    dispatch(work, seeds, &mut outstanding)?;

    while outstanding > 0 {
        let result = results
            .recv_async()
            .await
            .map_err(|_| CrawlError::WorkersExited { outstanding })?;
        outstanding -= 1;

        let discovered = site.add_crawled_page(result);
        dispatch(work, discovered, &mut outstanding)?;
        tracing::trace!("{} work item(s) outstanding", outstanding);
    }

    Ok(())
}

fn dispatch(
    work: &Sender<WorkMessage>,
    items: Vec<WorkItem>,
    outstanding: &mut usize,
) -> crate::Result<()> {
    for item in items {
        *outstanding += 1;
        work.send(WorkMessage::Crawl(item))
            .map_err(|_| CrawlError::WorkersExited {
                outstanding: *outstanding,
            })?;
    }
    Ok(())
}

/// Crawls a site as configured
///
/// # Example
///
/// ```no_run
/// use linkcrawl::config::Config;
///
/// # async fn run() -> linkcrawl::Result<()> {
/// let config = Config {
///     start_urls: vec!["http://localhost:8000/".to_string()],
///     ..Config::default()
/// };
/// let site = linkcrawl::crawl(config).await?;
/// println!("{} pages, ok: {}", site.pages().len(), site.is_ok());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> crate::Result<Site> {
    Crawler::new(config)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{ElementKind, Link};
    use std::path::PathBuf;

    fn url(s: &str) -> NormalizedUrl {
        normalize_url(s).unwrap()
    }

    fn site() -> Site {
        Site::new(CrawlPolicy::new(&[url("http://x/")], &[], &[], false))
    }

    #[test]
    fn test_new_rejects_unsupported_type() {
        let mut config = Config {
            start_urls: vec!["http://x/".to_string()],
            ..Config::default()
        };
        config.crawler.types = vec!["video".to_string()];

        let result = Crawler::new(config);
        assert!(matches!(
            result,
            Err(CrawlError::Config(ConfigError::UnsupportedElementKind(_)))
        ));
    }

    #[test]
    fn test_new_requires_start_url() {
        assert!(matches!(
            Crawler::new(Config::default()),
            Err(CrawlError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_new_rejects_process_mode_without_program() {
        let mut config = Config {
            start_urls: vec!["http://x/".to_string()],
            ..Config::default()
        };
        config.performance.mode = Mode::Process;
        assert!(matches!(
            Crawler::new(config.clone()),
            Err(CrawlError::Config(ConfigError::Validation(_)))
        ));

        config.performance.worker_program = Some(PathBuf::from("/usr/bin/linkcrawl"));
        assert!(Crawler::new(config).is_ok());
    }

    #[tokio::test]
    async fn test_consume_counts_discovered_work() {
        let mut site = site();
        let seeds = site.seed(&[url("http://x/")]);
        let (work_tx, work_rx) = flume::unbounded();
        let (results_tx, results_rx) = flume::unbounded();

        // answer the root with one link, then the link with a 404
        let mut root = FetchResult::http_error(url("http://x/"), 200);
        root.final_url = Some(url("http://x/"));
        root.links.push(Link {
            kind: ElementKind::Anchor,
            url: url("http://x/missing"),
            origin: url("http://x/"),
            snippet: "<a href=\"/missing\"></a>".to_string(),
        });
        results_tx.send(root).unwrap();
        results_tx
            .send(FetchResult::http_error(url("http://x/missing"), 404))
            .unwrap();

        consume(&mut site, seeds, &work_tx, &results_rx).await.unwrap();

        let issued: Vec<_> = work_rx.drain().collect();
        assert_eq!(issued.len(), 2);
        assert_eq!(site.pages().len(), 2);
        assert!(!site.is_ok());
    }

    #[tokio::test]
    async fn test_consume_fails_when_workers_are_gone() {
        let mut site = site();
        let seeds = site.seed(&[url("http://x/")]);
        let (work_tx, _work_rx) = flume::unbounded();
        let (results_tx, results_rx) = flume::unbounded::<FetchResult>();
        drop(results_tx);

        let result = consume(&mut site, seeds, &work_tx, &results_rx).await;
        assert!(matches!(
            result,
            Err(CrawlError::WorkersExited { outstanding: 1 })
        ));
    }
}
