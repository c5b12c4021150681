use crate::config::types::{Config, CrawlerConfig, Mode, PerformanceConfig};
use crate::crawler::parse_element_kinds;
use crate::url::normalize_url;
use crate::ConfigError;

/// Validates the entire configuration, start URLs included
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.start_urls.is_empty() {
        return Err(ConfigError::Validation(
            "At least one starting URL must be supplied.".to_string(),
        ));
    }

    if config.performance.mode == Mode::Process && config.performance.worker_program.is_none() {
        return Err(ConfigError::Validation(
            "process mode needs a worker program".to_string(),
        ));
    }

    validate_settings(config)
}

/// Validates everything except the presence of start URLs
///
/// A config file may leave the start URLs to the command line.
pub fn validate_settings(config: &Config) -> Result<(), ConfigError> {
    validate_start_urls(&config.start_urls)?;
    validate_crawler_config(&config.crawler)?;
    validate_performance_config(&config.performance)?;
    Ok(())
}

fn validate_start_urls(urls: &[String]) -> Result<(), ConfigError> {
    for url in urls {
        normalize_url(url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", url, e)))?;
    }
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let kinds = parse_element_kinds(&config.types)?;
    if kinds.is_empty() {
        return Err(ConfigError::Validation(
            "At least one element type must be followed".to_string(),
        ));
    }

    for pattern in &config.accepted_hosts {
        validate_host_pattern(pattern)?;
    }

    if config.password.is_some() && config.username.is_none() {
        return Err(ConfigError::Validation(
            "A password requires a username".to_string(),
        ));
    }

    Ok(())
}

fn validate_performance_config(config: &PerformanceConfig) -> Result<(), ConfigError> {
    if config.workers == Some(0) {
        return Err(ConfigError::Validation(
            "workers must be >= 1, got 0".to_string(),
        ));
    }

    if config.timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout must be >= 1 second, got {}",
            config.timeout
        )));
    }

    Ok(())
}

/// Validates an accepted-host pattern (supports `*.` wildcards)
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    let host = pattern.trim();
    if host.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = host.strip_prefix("*.") {
        if domain.is_empty() || domain.starts_with('.') || domain.contains('*') {
            return Err(ConfigError::InvalidPattern(format!(
                "Wildcard pattern '{}' needs a base domain",
                pattern
            )));
        }
        return Ok(());
    }

    if host.contains('*') {
        return Err(ConfigError::InvalidPattern(format!(
            "Wildcards are only allowed as a leading '*.', got '{}'",
            pattern
        )));
    }

    normalize_url(host)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidPattern(format!("Invalid host '{}': {}", pattern, e)))
}
