// Service configuration
//
// Loaded from environment variables (after `.env`) with fallback to defaults.
// Only DATABASE_URL is required.

use std::env;
use std::time::Duration;

/// Pricing service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    pub host: String,

    pub port: u16,

    /// Upper bound of the connection pool
    pub db_max_connections: u32,

    /// How long to wait for a pooled connection
    pub db_acquire_timeout: Duration,

    /// Lifetime of cached rule lookups; zero disables the cache
    pub rule_cache_ttl: Duration,
}

impl PricingConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = PricingConfig {
            database_url: lookup("DATABASE_URL")
                .filter(|url| !url.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingRequired("DATABASE_URL".to_string()))?,

            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            db_acquire_timeout: lookup("DB_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or_else(|| "3".to_string())
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue("DB_ACQUIRE_TIMEOUT_SECS".to_string()))?,

            rule_cache_ttl: lookup("RULE_CACHE_TTL_SECS")
                .unwrap_or_else(|| "60".to_string())
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue("RULE_CACHE_TTL_SECS".to_string()))?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cache_enabled(&self) -> bool {
        !self.rule_cache_ttl.is_zero()
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<PricingConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PricingConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/books")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.rule_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.cache_enabled());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db/books"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("RULE_CACHE_TTL_SECS", "0"),
        ])
        .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert!(!config.cache_enabled());
    }

    #[test]
    fn test_missing_database_url() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingRequired(_))));
        assert!(matches!(
            load(&[("DATABASE_URL", "  ")]),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("DATABASE_URL", "postgres://db"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "PORT"));

        let err = load(&[("DATABASE_URL", "postgres://db"), ("DB_MAX_CONNECTIONS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let err = load(&[("DATABASE_URL", "postgres://db"), ("RULE_CACHE_TTL_SECS", "-1")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
