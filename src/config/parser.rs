use crate::config::types::CrawlConfig;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Reads and parses a configuration file without validating it
///
/// The CLI uses this to get a base configuration it then overrides with flags,
/// validating only the merged result.
pub fn read_config(path: &Path) -> Result<CrawlConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: CrawlConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(CrawlConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use honey_dl::config::load_config;
///
/// let config = load_config(Path::new("honey.toml")).unwrap();
/// println!("Navigator: {}", config.navigator);
/// ```
pub fn load_config(path: &Path) -> Result<CrawlConfig, ConfigError> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Reads a configuration without validating it and returns its hash as well
pub fn read_config_with_hash(path: &Path) -> Result<(CrawlConfig, String), ConfigError> {
    let config = read_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Decodes a JSON object of string values, as accepted by `--headers` and `--proxies`
///
/// An empty string decodes to an empty map.
pub fn parse_json_map(
    option: &'static str,
    value: &str,
) -> Result<BTreeMap<String, String>, ConfigError> {
    if value.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(value).map_err(|source| ConfigError::Json { option, source })
}
