//! Configuration module for linkcrawl
//!
//! This module handles loading, parsing and validating TOML configuration
//! files, and resolves a validated configuration into the pieces the crawl
//! engine consumes: a [`CrawlPolicy`] and a [`WorkerConfig`].
//!
//! # Example
//!
//! ```no_run
//! use linkcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("linkcrawl.toml")).unwrap();
//! println!("Crawler will use {:?} mode", config.performance.mode);
//! ```

mod parser;
mod policy;
mod types;
mod validation;

pub use policy::CrawlPolicy;
pub use types::{
    Config, CrawlerConfig, Mode, OutputConfig, PerformanceConfig, When, DEFAULT_TIMEOUT_SECS,
};

pub use parser::{load_config, parse_config};
pub use validation::{validate, validate_settings};

use crate::crawler::{parse_element_kinds, Credentials, WorkerConfig};
use crate::ConfigError;

impl Config {
    /// Builds the settings every worker is spawned with
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        let credentials = self.crawler.username.as_ref().map(|username| Credentials {
            username: username.clone(),
            password: self.crawler.password.clone(),
        });

        Ok(WorkerConfig {
            timeout_secs: self.performance.timeout,
            types: parse_element_kinds(&self.crawler.types)?,
            credentials,
        })
    }
}
