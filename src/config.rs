//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;

use crate::error::{CacheError, Result};

/// Default cache capacity in megabytes.
pub const DEFAULT_CAPACITY_MB: i64 = 10;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Memory bound of the cache in megabytes
    pub capacity_mb: i64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY_MB` - Memory bound in megabytes (default: 10)
    ///
    /// Unparseable values fall back to the default. Non-positive values are
    /// kept so that [`Config::validate`] and cache construction can reject them.
    pub fn from_env() -> Self {
        Self {
            capacity_mb: env::var("CACHE_CAPACITY_MB")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_CAPACITY_MB),
        }
    }

    /// Checks that the configured values can build a cache.
    pub fn validate(&self) -> Result<()> {
        if self.capacity_mb <= 0 {
            return Err(CacheError::InvalidConfig(format!(
                "CACHE_CAPACITY_MB must be greater than zero, got {}",
                self.capacity_mb
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity_mb: DEFAULT_CAPACITY_MB,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.capacity_mb, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the variable to avoid races between tests
        env::remove_var("CACHE_CAPACITY_MB");
        assert_eq!(Config::from_env().capacity_mb, DEFAULT_CAPACITY_MB);

        env::set_var("CACHE_CAPACITY_MB", "42");
        assert_eq!(Config::from_env().capacity_mb, 42);

        env::set_var("CACHE_CAPACITY_MB", "not-a-number");
        assert_eq!(Config::from_env().capacity_mb, DEFAULT_CAPACITY_MB);

        env::set_var("CACHE_CAPACITY_MB", "-3");
        let config = Config::from_env();
        assert_eq!(config.capacity_mb, -3);
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));

        env::remove_var("CACHE_CAPACITY_MB");
    }
}
