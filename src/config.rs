//! Database configuration, parsed from a construction URI.
//!
//! ```text
//! rtree://?strict=false&default_expiration=3600&cleanup_interval=600
//! ```
//!
//! | parameter            | type           | default | meaning                                  |
//! |----------------------|----------------|---------|------------------------------------------|
//! | `strict`             | bool           | `true`  | abort indexing on a degenerate rectangle |
//! | `default_expiration` | seconds (u64)  | `0`     | cache entry lifetime, `0` = never expire |
//! | `cleanup_interval`   | seconds (u64)  | `0`     | cache sweep period, `0` = never sweep    |
//!
//! Unknown parameters are ignored.

use crate::error::{Result, SpatialError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Minimum children per R-tree node.
pub const RTREE_MIN_CHILDREN: usize = 25;
/// Maximum children per R-tree node.
pub const RTREE_MAX_CHILDREN: usize = 50;
/// Entries reinserted on node overflow by the R*-tree insertion strategy.
pub const RTREE_REINSERTION_COUNT: usize = 10;

/// Side of the square probe rectangle built around a query coordinate.
pub const PROBE_EXTENT: f64 = 0.0001;

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_strict")]
    pub strict: bool,

    /// Zero means cache entries never expire.
    #[serde(default)]
    pub default_expiration: Duration,

    /// Zero disables the background sweep; expired entries are still hidden on read.
    #[serde(default)]
    pub cleanup_interval: Duration,
}

impl DatabaseConfig {
    const fn default_strict() -> bool {
        true
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_default_expiration(mut self, expiration: Duration) -> Self {
        self.default_expiration = expiration;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Parse the query parameters of a construction URI.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let url = Url::parse(uri)?;
        Self::from_url(&url)
    }

    pub fn from_url(url: &Url) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = first_param(url, "strict") {
            config.strict = parse_bool("strict", &value)?;
        }

        if let Some(value) = first_param(url, "default_expiration") {
            config.default_expiration = parse_seconds("default_expiration", &value)?;
        }

        if let Some(value) = first_param(url, "cleanup_interval") {
            config.cleanup_interval = parse_seconds("cleanup_interval", &value)?;
        }

        Ok(config)
    }

    /// `Some` when cache entries carry a default lifetime.
    pub fn expiration(&self) -> Option<Duration> {
        (!self.default_expiration.is_zero()).then_some(self.default_expiration)
    }

    /// `Some` when the cache should be swept periodically.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (!self.cleanup_interval.is_zero()).then_some(self.cleanup_interval)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            strict: Self::default_strict(),
            default_expiration: Duration::ZERO,
            cleanup_interval: Duration::ZERO,
        }
    }
}

fn first_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid_option(name, value)),
    }
}

fn parse_seconds(name: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| invalid_option(name, value))
}

fn invalid_option(name: &str, value: &str) -> SpatialError {
    SpatialError::InvalidOption {
        name: name.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = DatabaseConfig::from_uri("rtree://").unwrap();
        assert_eq!(config, DatabaseConfig::default());
        assert!(config.strict);
        assert!(config.expiration().is_none());
        assert!(config.sweep_interval().is_none());
    }

    #[test]
    fn test_config_from_uri() {
        let config = DatabaseConfig::from_uri(
            "rtree://?strict=false&default_expiration=3600&cleanup_interval=60&dsn=ignored.db",
        )
        .unwrap();

        assert!(!config.strict);
        assert_eq!(config.expiration(), Some(Duration::from_secs(3600)));
        assert_eq!(config.sweep_interval(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_config_first_parameter_wins() {
        let config = DatabaseConfig::from_uri("rtree://?strict=false&strict=true").unwrap();
        assert!(!config.strict);
    }

    #[test]
    fn test_config_rejects_bad_numbers() {
        let err = DatabaseConfig::from_uri("rtree://?default_expiration=soon").unwrap_err();
        assert!(matches!(
            err,
            SpatialError::InvalidOption { ref name, .. } if name == "default_expiration"
        ));

        assert!(DatabaseConfig::from_uri("rtree://?cleanup_interval=-5").is_err());
        assert!(DatabaseConfig::from_uri("rtree://?strict=maybe").is_err());
    }

    #[test]
    fn test_config_rejects_malformed_uri() {
        let err = DatabaseConfig::from_uri("not a uri").unwrap_err();
        assert!(matches!(err, SpatialError::InvalidUri(_)));
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = DatabaseConfig::default()
            .with_strict(false)
            .with_default_expiration(Duration::from_secs(5));

        let json = config.to_json().unwrap();
        assert_eq!(DatabaseConfig::from_json(&json).unwrap(), config);
    }
}
