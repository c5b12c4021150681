use crate::config::types::Config;
use crate::config::validation::validate_settings;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Every setting is validated, but the start URLs may be empty: they can
/// still be supplied on the command line.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use linkcrawl::config::load_config;
///
/// let config = load_config(Path::new("linkcrawl.toml")).unwrap();
/// println!("Workers: {}", config.performance.worker_count());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates a TOML configuration string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate_settings(&config)?;
    Ok(config)
}
