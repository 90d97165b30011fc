//! Logging configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Service name attached to the startup event
    pub service_name: String,

    /// Deployment environment (development, production)
    pub environment: String,

    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,

    /// JSON formatted logs instead of human-readable lines
    pub json_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service_name: "signed-notification-relay".to_string(),
            environment: "development".to_string(),
            log_level: "debug".to_string(),
            json_logs: false,
        }
    }
}

impl LoggingConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LOG_ENV`: `development` (default) or `production`/`json` for JSON logs
    /// - `LOG_LEVEL`: Log level (default: debug); `RUST_LOG` wins when set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let environment = lookup("LOG_ENV")
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.environment);

        Self {
            json_logs: matches!(environment.as_str(), "production" | "prod" | "json"),
            environment,
            log_level: lookup("LOG_LEVEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_level),
            service_name: defaults.service_name,
        }
    }
}
