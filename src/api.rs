//! Blocking entry points for using linkcrawl as a library
//!
//! Both functions build their own single-threaded runtime, so they must not
//! be called from inside an async context. Use [`crate::crawl`] there.

use crate::config::{Config, Mode};
use crate::state::Site;
use std::path::PathBuf;
use tokio::runtime::Builder;

/// Crawl settings, named after the command-line options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOptions {
    pub test_outside: bool,
    pub accepted_hosts: Vec<String>,
    pub ignored_prefixes: Vec<String>,
    /// Element kinds to follow; all kinds when absent
    pub types: Option<Vec<String>>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub mode: Mode,
    /// Pool size; the mode's default when absent
    pub workers: Option<usize>,
    /// Per-fetch timeout in seconds
    pub timeout: Option<u64>,
    /// Worker executable, required in process mode
    pub worker_program: Option<PathBuf>,
}

impl CrawlOptions {
    /// Builds a crawl configuration starting from `urls`
    pub fn into_config<S: AsRef<str>>(self, urls: &[S]) -> Config {
        let mut config = Config {
            start_urls: urls.iter().map(|u| u.as_ref().to_string()).collect(),
            ..Config::default()
        };

        config.crawler.test_outside = self.test_outside;
        config.crawler.accepted_hosts = self.accepted_hosts;
        config.crawler.ignored_prefixes = self.ignored_prefixes;
        if let Some(types) = self.types {
            config.crawler.types = types;
        }
        config.crawler.username = self.username;
        config.crawler.password = self.password;

        config.performance.mode = self.mode;
        config.performance.workers = self.workers;
        if let Some(timeout) = self.timeout {
            config.performance.timeout = timeout;
        }
        config.performance.worker_program = self.worker_program;

        config
    }
}

/// Crawls one URL with the default options
pub fn crawl(url: &str) -> crate::Result<Site> {
    crawl_with_options(&[url], CrawlOptions::default())
}

/// Crawls from several URLs with the given options
pub fn crawl_with_options<S: AsRef<str>>(urls: &[S], options: CrawlOptions) -> crate::Result<Site> {
    crawl_config(options.into_config(urls))
}

/// Crawls as configured, blocking until the crawl is finished
pub fn crawl_config(config: Config) -> crate::Result<Site> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(crate::crawl(config))
}
