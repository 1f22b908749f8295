//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::scheduler::OverlapPolicy;
use crate::source::BackoffPolicy;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub source: SourceConfig,
    pub retry: RetryConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 1323)
    pub port: u16,
}

impl ServerConfig {
    /// Socket address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

impl DatabaseConfig {
    /// sqlx connection string; creates the file if missing
    pub fn connection_string(&self) -> String {
        crate::data::sqlite_url(&self.path)
    }
}

/// Cache backend selector
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
}

/// Cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    /// Redis host
    pub host: String,
    /// Redis port
    pub port: u16,
    /// TTL of the "all posts" snapshot in seconds (default: 60)
    pub ttl_seconds: u64,
}

impl CacheConfig {
    /// Redis connection URL, e.g. "redis://localhost:6379"
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// External source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Endpoint returning a JSON array of posts
    pub url: String,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
}

/// Fetch retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub initial_interval_ms: u64,
    pub multiplier: f64,
    pub max_interval_ms: u64,
    /// Total budget measured from the first attempt
    pub max_elapsed_ms: u64,
}

impl RetryConfig {
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial_interval: Duration::from_millis(self.initial_interval_ms),
            multiplier: self.multiplier,
            max_interval: Duration::from_millis(self.max_interval_ms),
            max_elapsed: Duration::from_millis(self.max_elapsed_ms),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Run the scheduler inside the HTTP server process
    pub enabled: bool,
    /// 5-field cron expression for the sync job
    pub sync_schedule: String,
    /// Bounded execution window for one sync run
    pub run_timeout_seconds: u64,
    #[serde(default)]
    pub overlap: OverlapPolicy,
}

impl SchedulerConfig {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (POSTSYNC__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 1323)?
            .set_default("database.path", "data/postsync.db")?
            .set_default("cache.backend", "redis")?
            .set_default("cache.host", "localhost")?
            .set_default("cache.port", 6379)?
            .set_default("cache.ttl_seconds", 60)?
            .set_default("source.url", "https://jsonplaceholder.typicode.com/posts")?
            .set_default("source.request_timeout_seconds", 30)?
            .set_default("retry.initial_interval_ms", 1000)?
            .set_default("retry.multiplier", 2.0)?
            .set_default("retry.max_interval_ms", 30_000)?
            .set_default("retry.max_elapsed_ms", 300_000)?
            .set_default("scheduler.enabled", false)?
            .set_default("scheduler.sync_schedule", "*/15 * * * *")?
            .set_default("scheduler.run_timeout_seconds", 600)?
            .set_default("scheduler.overlap", "skip")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("POSTSYNC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        if self.source.url.trim().is_empty() {
            return Err(AppError::Config("source.url must not be empty".to_string()));
        }
        url::Url::parse(&self.source.url)
            .map_err(|e| AppError::Config(format!("source.url is not a valid URL: {e}")))?;

        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(AppError::Config(
                "retry.multiplier must be a finite number of at least 1.0".to_string(),
            ));
        }

        if self.retry.initial_interval_ms == 0 {
            return Err(AppError::Config(
                "retry.initial_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_elapsed_ms == 0 {
            return Err(AppError::Config(
                "retry.max_elapsed_ms must be greater than 0".to_string(),
            ));
        }

        if self.retry.initial_interval_ms > self.retry.max_interval_ms {
            return Err(AppError::Config(
                "retry.initial_interval_ms must not exceed retry.max_interval_ms".to_string(),
            ));
        }

        if self.cache.ttl_seconds == 0 {
            return Err(AppError::Config(
                "cache.ttl_seconds must be greater than 0".to_string(),
            ));
        }

        if self.scheduler.run_timeout_seconds == 0 {
            return Err(AppError::Config(
                "scheduler.run_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self
            .logging
            .level
            .parse::<tracing::level_filters::LevelFilter>()
            .is_err()
        {
            return Err(AppError::Config(format!(
                "logging.level '{}' is not a log level",
                self.logging.level
            )));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(AppError::Config(format!(
                "logging.format must be \"pretty\" or \"json\", got '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 1323,
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/postsync-test.db"),
            },
            cache: CacheConfig {
                backend: CacheBackend::Memory,
                host: "localhost".to_string(),
                port: 6379,
                ttl_seconds: 60,
            },
            source: SourceConfig {
                url: "https://jsonplaceholder.typicode.com/posts".to_string(),
                request_timeout_seconds: 30,
            },
            retry: RetryConfig {
                initial_interval_ms: 1000,
                multiplier: 2.0,
                max_interval_ms: 30_000,
                max_elapsed_ms: 300_000,
            },
            scheduler: SchedulerConfig {
                enabled: false,
                sync_schedule: "*/15 * * * *".to_string(),
                run_timeout_seconds: 600,
                overlap: OverlapPolicy::Skip,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn connection_strings_are_assembled_from_parts() {
        let config = valid_config();
        assert_eq!(config.cache.redis_url(), "redis://localhost:6379");
        assert_eq!(
            config.database.connection_string(),
            "sqlite:/tmp/postsync-test.db?mode=rwc"
        );
        assert_eq!(config.server.bind_addr(), "127.0.0.1:1323");
    }

    #[test]
    fn retry_policy_mirrors_config() {
        let policy = valid_config().retry.policy();
        assert_eq!(policy, BackoffPolicy::default());
    }

    #[test]
    fn validate_rejects_bad_source_url() {
        let mut config = valid_config();
        config.source.url = "not a url".to_string();

        let error = config.validate().expect_err("invalid URL must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message) if message.contains("source.url")
        ));
    }

    #[test]
    fn validate_rejects_shrinking_multiplier() {
        let mut config = valid_config();
        config.retry.multiplier = 0.5;

        let error = config.validate().expect_err("multiplier below 1 must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message) if message.contains("retry.multiplier")
        ));
    }

    #[test]
    fn validate_rejects_non_finite_multiplier() {
        for multiplier in [f64::INFINITY, f64::NAN] {
            let mut config = valid_config();
            config.retry.multiplier = multiplier;

            let error = config.validate().expect_err("non-finite multiplier must fail");
            assert!(matches!(
                error,
                crate::error::AppError::Config(message) if message.contains("retry.multiplier")
            ));
        }
    }

    #[test]
    fn validate_rejects_zero_retry_intervals() {
        let mut config = valid_config();
        config.retry.initial_interval_ms = 0;
        let error = config.validate().expect_err("zero initial interval must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message) if message.contains("initial_interval_ms")
        ));

        let mut config = valid_config();
        config.retry.max_elapsed_ms = 0;
        let error = config.validate().expect_err("zero elapsed budget must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message) if message.contains("max_elapsed_ms")
        ));
    }

    #[test]
    fn validate_rejects_unknown_logging_settings() {
        let mut config = valid_config();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.logging.format = "xml".to_string();
        let error = config.validate().expect_err("unknown format must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message) if message.contains("logging.format")
        ));
    }

    #[test]
    fn validate_rejects_zero_ttl() {
        let mut config = valid_config();
        config.cache.ttl_seconds = 0;
        assert!(config.validate().is_err());
    }
}
