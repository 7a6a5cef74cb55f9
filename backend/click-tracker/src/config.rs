/// Configuration management for the click tracker and exporter
///
/// Loads configuration from environment variables. Binaries call
/// `dotenvy::dotenv()` first so a local `.env` file is honoured.
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub app: AppConfig,
    /// Durable queue (Redis) settings
    pub queue: QueueConfig,
    /// Analytics sink (ClickHouse) settings
    pub sink: SinkConfig,
    /// Batch exporter settings
    pub export: ExportConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
}

/// Queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Redis URL (redis://host:port/db)
    pub redis_url: String,
    /// List key holding pending click records
    pub key: String,
    /// Upper bound on a single Redis command
    pub command_timeout_ms: u64,
}

/// ClickHouse configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub url: String,
    pub database: String,
    pub table: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Upper bound on one batch load
    pub load_timeout_ms: u64,
}

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Records per dequeue / load attempt
    pub batch_size: usize,
    /// Run a cycle every N seconds; unset means run once and exit
    pub interval_secs: Option<u64>,
}

// Default values
pub const DEFAULT_HTTP_PORT: u16 = 8000;
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";
pub const DEFAULT_QUEUE_KEY: &str = "click_tracker:pending";
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_CLICKHOUSE_URL: &str = "http://localhost:8123";
pub const DEFAULT_DATABASE: &str = "click_tracker";
pub const DEFAULT_TABLE: &str = "clicks";
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 60_000;
pub use crate::exporter::DEFAULT_BATCH_SIZE;

impl QueueConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

impl SinkConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// `database.table`, safe to splice into SQL.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }
}

impl ExportConfig {
    pub fn interval(&self) -> Option<Duration> {
        self.interval_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: env_or("APP_ENV", "development"),
            host: env_or("APP_HOST", "0.0.0.0"),
            http_port: env_parse("PORT").unwrap_or(DEFAULT_HTTP_PORT),
        };

        let queue = QueueConfig {
            redis_url: env_or("REDIS_URL", DEFAULT_REDIS_URL),
            key: env_or("REDIS_KEY", DEFAULT_QUEUE_KEY),
            command_timeout_ms: env_parse("REDIS_COMMAND_TIMEOUT_MS")
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT_MS),
        };

        let sink = SinkConfig {
            url: env_or("CLICKHOUSE_URL", DEFAULT_CLICKHOUSE_URL),
            database: env_or("CLICKHOUSE_DATABASE", DEFAULT_DATABASE),
            table: env_or("CLICKHOUSE_TABLE", DEFAULT_TABLE),
            user: env_or("CLICKHOUSE_USER", "default"),
            password: env_or("CLICKHOUSE_PASSWORD", ""),
            load_timeout_ms: env_parse("CLICKHOUSE_LOAD_TIMEOUT_MS")
                .unwrap_or(DEFAULT_LOAD_TIMEOUT_MS),
        };

        let export = ExportConfig {
            batch_size: env_parse("EXPORT_BATCH_SIZE").unwrap_or(DEFAULT_BATCH_SIZE),
            interval_secs: env_parse("EXPORT_INTERVAL_SECS").filter(|secs| *secs > 0),
        };

        let config = Config {
            app,
            queue,
            sink,
            export,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.export.batch_size == 0 {
            bail!("EXPORT_BATCH_SIZE must be at least 1");
        }
        if self.queue.key.is_empty() {
            bail!("REDIS_KEY must not be empty");
        }
        for (name, value) in [
            ("CLICKHOUSE_DATABASE", &self.sink.database),
            ("CLICKHOUSE_TABLE", &self.sink.table),
        ] {
            if !is_identifier(value) {
                bail!(
                    "{} must contain only ASCII letters, digits and underscores, got {:?}",
                    name,
                    value
                );
            }
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with(|c: char| c.is_ascii_digit())
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 13] = [
        "APP_ENV",
        "APP_HOST",
        "PORT",
        "REDIS_URL",
        "REDIS_KEY",
        "REDIS_COMMAND_TIMEOUT_MS",
        "CLICKHOUSE_URL",
        "CLICKHOUSE_DATABASE",
        "CLICKHOUSE_TABLE",
        "CLICKHOUSE_USER",
        "CLICKHOUSE_LOAD_TIMEOUT_MS",
        "EXPORT_BATCH_SIZE",
        "EXPORT_INTERVAL_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
        std::env::remove_var("CLICKHOUSE_PASSWORD");
    }

    #[test]
    #[serial]
    fn test_default_values() {
        clear_env();

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.http_port, 8000);
        assert_eq!(config.queue.redis_url, "redis://localhost:6379/0");
        assert_eq!(config.queue.key, "click_tracker:pending");
        assert_eq!(config.queue.command_timeout(), Duration::from_secs(3));
        assert_eq!(config.sink.qualified_table(), "click_tracker.clicks");
        assert_eq!(config.sink.load_timeout(), Duration::from_secs(60));
        assert_eq!(config.export.batch_size, 500);
        assert_eq!(config.export.interval(), None);
    }

    #[test]
    #[serial]
    fn test_overrides_and_invalid_numbers() {
        clear_env();
        std::env::set_var("PORT", "9090");
        std::env::set_var("REDIS_KEY", "clicks:pending");
        std::env::set_var("EXPORT_BATCH_SIZE", "not-a-number");
        std::env::set_var("EXPORT_INTERVAL_SECS", "30");

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.http_port, 9090);
        assert_eq!(config.queue.key, "clicks:pending");
        assert_eq!(config.export.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.export.interval(), Some(Duration::from_secs(30)));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_batch_size_rejected() {
        clear_env();
        std::env::set_var("EXPORT_BATCH_SIZE", "0");

        assert!(Config::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_table_identifier_validated() {
        clear_env();
        std::env::set_var("CLICKHOUSE_TABLE", "clicks; DROP TABLE x");

        assert!(Config::from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("clicks_2024"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2024clicks"));
        assert!(!is_identifier("db.table"));
    }
}
