//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue("LOG_FORMAT")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Connections kept open while idle
    pub database_min_connections: u32,

    /// Maximum lifetime of a pooled connection
    pub database_max_lifetime: Duration,

    /// How long `begin` waits for a pooled connection
    pub database_acquire_timeout: Duration,

    /// Server-side statement timeout
    pub database_statement_timeout: Duration,

    /// Environment (development, production)
    pub environment: String,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 10)?;
        let database_min_connections = parse_env("DATABASE_MIN_CONNECTIONS", 5)?;
        if database_min_connections > database_max_connections {
            return Err(ConfigError::InvalidValue("DATABASE_MIN_CONNECTIONS"));
        }

        let database_max_lifetime =
            Duration::from_secs(parse_env("DATABASE_MAX_LIFETIME_SECS", 300)?);
        let database_acquire_timeout =
            Duration::from_secs(parse_env("DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?);
        let database_statement_timeout =
            Duration::from_millis(parse_env("DATABASE_STATEMENT_TIMEOUT_MS", 5000)?);

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config = Self {
            database_url,
            database_max_connections,
            database_min_connections,
            database_max_lifetime,
            database_acquire_timeout,
            database_statement_timeout,
            environment,
            log_format: LogFormat::Pretty,
        };
        config.log_format = config.resolve_log_format(env::var("LOG_FORMAT").ok())?;

        Ok(config)
    }

    /// An explicit `LOG_FORMAT` wins; otherwise production logs JSON
    fn resolve_log_format(&self, explicit: Option<String>) -> Result<LogFormat, ConfigError> {
        match explicit {
            Some(value) => value.parse(),
            None if self.is_production() => Ok(LogFormat::Json),
            None => Ok(LogFormat::Pretty),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
