//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Idempotency
//!
//! - `CACHE_BACKEND`: `memory` (default) or `redis`
//! - `REDIS_HOST` / `REDIS_PORT`: shared cache location (default: `localhost:6380`)
//! - `CACHE_TTL_SECS`: lifetime of a cached response (default: 3600)
//! - `IDEMPOTENCY_WAIT_MS`: how long a caller waits before getting TIMEDOUT (default: 2000)
//!
//! # Logging
//!
//! - `LOG_WATCHDOG_MS`: delay before a slow request gets a timeout warning (default: 5000)
//! - `LOG_FORMAT`: `json` or `pretty` (default: `pretty`)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Which cache store backs the deduplicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// In-process Moka cache
    Memory,
    /// Shared Redis server
    Redis,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown cache backend '{other}' (expected memory or redis)")),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    /// Maximum buffered body size in bytes, for requests and responses (default: 10MB)
    pub max_request_body_size: usize,

    /// Comma-separated list of allowed CORS origins
    /// Use "*" to allow all origins (not recommended for production)
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Cache Store Configuration
    // =========================================================================
    /// Cache store backend (default: memory)
    pub cache_backend: CacheBackend,

    /// Redis host (default: "localhost")
    pub redis_host: String,

    /// Redis port (default: 6380)
    pub redis_port: u16,

    /// Lifetime of an idempotency cache entry (default: 1 hour)
    pub cache_ttl: Duration,

    /// Capacity of the in-memory store (default: 1000)
    pub cache_max_entries: u64,

    // =========================================================================
    // Middleware Timing Configuration
    // =========================================================================
    /// Bounded wait before an idempotent request answers TIMEDOUT (default: 2000ms)
    pub idempotency_wait: Duration,

    /// Delay before the request logger emits a timeout warning (default: 5000ms)
    pub log_watchdog: Duration,

    /// Simulated downstream latency for `/sample/timeout` (default: 5000ms)
    pub sample_delay: Duration,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any value cannot be parsed or fails
    /// validation.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,
            max_request_body_size: Self::parse_env("MAX_REQUEST_BODY_SIZE", 10 * 1024 * 1024)?, // 10MB
            cors_allowed_origins: Self::parse_cors_origins(),

            // Cache store
            cache_backend: Self::parse_env("CACHE_BACKEND", CacheBackend::Memory)?,
            redis_host: env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_string()),
            redis_port: Self::parse_env("REDIS_PORT", 6380)?,
            cache_ttl: Duration::from_secs(Self::parse_env("CACHE_TTL_SECS", 60 * 60)?),
            cache_max_entries: Self::parse_env("CACHE_MAX_ENTRIES", 1000)?,

            // Middleware timing
            idempotency_wait: Duration::from_millis(Self::parse_env("IDEMPOTENCY_WAIT_MS", 2000)?),
            log_watchdog: Duration::from_millis(Self::parse_env("LOG_WATCHDOG_MS", 5000)?),
            sample_delay: Duration::from_millis(Self::parse_env("SAMPLE_DELAY_MS", 5000)?),

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        if self.cache_ttl.is_zero() {
            return Err(AppError::ConfigError(
                "CACHE_TTL_SECS must be greater than 0".to_string(),
            ));
        }

        if self.cache_max_entries == 0 {
            return Err(AppError::ConfigError(
                "CACHE_MAX_ENTRIES must be greater than 0".to_string(),
            ));
        }

        if self.idempotency_wait.is_zero() {
            return Err(AppError::ConfigError(
                "IDEMPOTENCY_WAIT_MS must be greater than 0".to_string(),
            ));
        }

        if self.log_watchdog.is_zero() {
            return Err(AppError::ConfigError(
                "LOG_WATCHDOG_MS must be greater than 0".to_string(),
            ));
        }

        if self.max_request_body_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection URL for the Redis cache backend.
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse CORS allowed origins from environment variable.
    fn parse_cors_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_request_body_size: 10 * 1024 * 1024, // 10MB
            cors_allowed_origins: vec!["*".to_string()],
            // Cache store
            cache_backend: CacheBackend::Memory,
            redis_host: "localhost".to_string(),
            redis_port: 6380,
            cache_ttl: Duration::from_secs(60 * 60),
            cache_max_entries: 1000,
            // Middleware timing
            idempotency_wait: Duration::from_millis(2000),
            log_watchdog: Duration::from_millis(5000),
            sample_delay: Duration::from_millis(5000),
            // Observability
            log_level: "info".to_string(),
            log_json: false,
            metrics_port: 9090,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cache_backend, CacheBackend::Memory);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.idempotency_wait, Duration::from_millis(2000));
        assert_eq!(config.log_watchdog, Duration::from_millis(5000));
        assert_eq!(config.redis_port, 6380);
    }

    #[test]
    fn test_server_addr_format() {
        let config = Config {
            host: "localhost".to_string(),
            port: 3000,
            ..Config::default()
        };

        assert_eq!(config.server_addr(), "localhost:3000");
    }

    #[test]
    fn test_redis_url_format() {
        let config = Config {
            redis_host: "cache.internal".to_string(),
            redis_port: 6379,
            ..Config::default()
        };

        assert_eq!(config.redis_url(), "redis://cache.internal:6379");
    }

    #[test]
    fn test_cache_backend_parsing() {
        assert_eq!("memory".parse::<CacheBackend>(), Ok(CacheBackend::Memory));
        assert_eq!(" Redis ".parse::<CacheBackend>(), Ok(CacheBackend::Redis));
        assert!("memcached".parse::<CacheBackend>().is_err());
    }

    #[test]
    fn test_metrics_addr_disabled() {
        let config = Config {
            metrics_port: 0,
            ..Config::default()
        };
        assert!(config.metrics_addr().is_none());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = Config {
            cache_ttl: Duration::ZERO,
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("CACHE_TTL_SECS"));
    }

    #[test]
    fn test_validate_zero_wait() {
        let config = Config {
            idempotency_wait: Duration::ZERO,
            ..Config::default()
        };

        let result = config.validate();
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("IDEMPOTENCY_WAIT_MS")
        );
    }

    #[test]
    fn test_validate_zero_max_entries() {
        let config = Config {
            cache_max_entries: 0,
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }
}
