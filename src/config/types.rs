use crate::crawler::ElementKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default per-fetch timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Main configuration structure for linkcrawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// URLs the crawl starts from; their hosts are local
    #[serde(default)]
    pub start_urls: Vec<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub performance: PerformanceConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// What gets crawled and how
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Fetch links to other hosts, without following their links
    #[serde(default)]
    pub test_outside: bool,

    /// Extra hosts considered local (e.g. "*.example.com")
    #[serde(default)]
    pub accepted_hosts: Vec<String>,

    /// URL prefixes that are never fetched (e.g. "example.com/private/")
    #[serde(default)]
    pub ignored_prefixes: Vec<String>,

    /// Element kinds whose references are followed
    #[serde(default = "default_types")]
    pub types: Vec<String>,

    /// HTTP basic auth user
    #[serde(default)]
    pub username: Option<String>,

    /// HTTP basic auth password
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            test_outside: false,
            accepted_hosts: Vec::new(),
            ignored_prefixes: Vec::new(),
            types: default_types(),
            username: None,
            password: None,
        }
    }
}

fn default_types() -> Vec<String> {
    ElementKind::ALL.iter().map(|k| k.tag().to_string()).collect()
}

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PerformanceConfig {
    #[serde(default)]
    pub mode: Mode,

    /// Number of workers; defaults per mode when absent
    #[serde(default)]
    pub workers: Option<usize>,

    /// Per-fetch timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Executable started for each worker in process mode
    ///
    /// Required in process mode. The command line fills in its own
    /// executable when unset.
    #[serde(default)]
    pub worker_program: Option<PathBuf>,
}

impl PerformanceConfig {
    /// The configured worker count, or the mode's default
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| self.mode.default_workers())
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            workers: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            worker_program: None,
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Worker pool backend
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// OS threads
    #[default]
    Thread,

    /// OS processes
    Process,

    /// Cooperative tasks on a single thread
    Green,
}

impl Mode {
    /// Pool size used when none is configured
    pub fn default_workers(&self) -> usize {
        match self {
            Self::Thread | Self::Process => 1,
            Self::Green => 1000,
        }
    }
}

/// Report configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub when: When,

    /// Report file; stdout when absent
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// When the report is written
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum When {
    #[default]
    Always,

    /// Only when at least one page is in error
    Error,
}
