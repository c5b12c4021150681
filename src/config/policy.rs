//! Resolved crawl policy
//!
//! Built once from a validated [`Config`] and consulted by the frontier for
//! every discovered link.

use crate::config::Config;
use crate::url::{matches_host, normalize_url, NormalizedUrl};
use crate::ConfigError;

/// Decides which URLs are local and which may be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlPolicy {
    /// Host patterns (`host[:port]` or `*.domain`) considered local
    accepted_hosts: Vec<String>,

    /// Prefixes of URLs that are never fetched
    ignored_prefixes: Vec<String>,

    /// Fetch non-local URLs too (without expanding them)
    test_outside: bool,
}

impl CrawlPolicy {
    /// Creates a policy whose local hosts are the start URLs' hosts plus
    /// `accepted_hosts`
    pub fn new(
        start_urls: &[NormalizedUrl],
        accepted_hosts: &[String],
        ignored_prefixes: &[String],
        test_outside: bool,
    ) -> Self {
        let mut hosts: Vec<String> = Vec::new();
        let explicit = accepted_hosts.iter().filter_map(|pattern| host_pattern(pattern));
        for host in start_urls.iter().map(|u| u.host().to_string()).chain(explicit) {
            if !hosts.contains(&host) {
                hosts.push(host);
            }
        }

        Self {
            accepted_hosts: hosts,
            ignored_prefixes: ignored_prefixes
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            test_outside,
        }
    }

    /// Builds the policy from a configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let start_urls = config
            .start_urls
            .iter()
            .map(|u| {
                normalize_url(u)
                    .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", u, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(
            &start_urls,
            &config.crawler.accepted_hosts,
            &config.crawler.ignored_prefixes,
            config.crawler.test_outside,
        ))
    }

    /// True when the URL's host is one of the accepted hosts
    pub fn is_local(&self, url: &NormalizedUrl) -> bool {
        self.accepted_hosts
            .iter()
            .any(|pattern| matches_host(pattern, url.host()))
    }

    /// True when the URL may be fetched at all
    ///
    /// Local URLs are fetched, other hosts only when testing outside links.
    /// Ignored prefixes win over both.
    pub fn should_download(&self, url: &NormalizedUrl) -> bool {
        (self.test_outside || self.is_local(url)) && !self.is_ignored(url)
    }

    fn is_ignored(&self, url: &NormalizedUrl) -> bool {
        if self.ignored_prefixes.is_empty() {
            return false;
        }

        let full = url.to_string();
        let host_and_path = url.host_and_path();
        self.ignored_prefixes
            .iter()
            .any(|prefix| full.starts_with(prefix) || host_and_path.starts_with(prefix))
    }

    pub fn accepted_hosts(&self) -> &[String] {
        &self.accepted_hosts
    }

    pub fn test_outside(&self) -> bool {
        self.test_outside
    }
}

/// Reduces an accepted-host entry to the form hosts are compared in
///
/// Entries may be written as bare hosts or as URLs.
fn host_pattern(pattern: &str) -> Option<String> {
    let pattern = pattern.trim();
    if pattern.starts_with("*.") {
        return Some(pattern.to_lowercase());
    }

    match normalize_url(pattern) {
        Ok(url) => Some(url.host().to_string()),
        Err(e) => {
            tracing::warn!("Ignoring accepted host '{}': {}", pattern, e);
            None
        }
    }
}
