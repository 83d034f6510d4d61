//! Configuration management for the Agnosis API
//!
//! Configuration is layered: compiled-in defaults, then an optional TOML
//! file, then `AGNOSIS_*` environment variables, then CLI flags applied by
//! `main`. Everything is validated before the server starts.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Default config file consulted when no `--config` flag is given
pub const DEFAULT_CONFIG_FILE: &str = "agnosis.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Metrics and monitoring
    pub metrics: MetricsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: SocketAddr,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,

    /// Token lifetime as a duration string ("30s", "15m", "24h")
    pub token_ttl: String,

    /// bcrypt work factor for password hashing
    pub bcrypt_cost: u32,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend type
    pub storage_type: StorageType,
}

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Embedded in-memory property graph
    Memory,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable the Prometheus text exposition endpoint
    pub enable_prometheus: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".parse().expect("static address"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // Development fallback only; `validate` warns when it is left in place
            jwt_secret: "agnosis-dev-secret".to_string(),
            token_ttl: "24h".to_string(),
            bcrypt_cost: 10,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Memory,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enable_prometheus: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default file (if present) and environment
    pub fn load() -> Result<Self> {
        let mut config = if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply `AGNOSIS_*` environment variable overrides.
    ///
    /// Called by `load`; callers going through `from_file` directly must
    /// apply this themselves to keep env vars above the file in the layering.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(addr) = env::var("AGNOSIS_HTTP_ADDR") {
            self.server.http_addr = addr
                .parse()
                .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
        }

        if let Ok(secret) = env::var("AGNOSIS_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Ok(ttl) = env::var("AGNOSIS_TOKEN_TTL") {
            self.auth.token_ttl = ttl;
        }

        if let Ok(cost) = env::var("AGNOSIS_BCRYPT_COST") {
            self.auth.bcrypt_cost = cost
                .parse()
                .map_err(|e| Error::config(format!("Invalid bcrypt cost: {}", e)))?;
        }

        if let Ok(enabled) = env::var("AGNOSIS_ENABLE_PROMETHEUS") {
            self.metrics.enable_prometheus = enabled
                .parse()
                .map_err(|_| Error::config("Invalid AGNOSIS_ENABLE_PROMETHEUS (expected true or false)"))?;
        }

        if let Ok(level) = env::var("AGNOSIS_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("AGNOSIS_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(Error::config("JWT secret must not be empty"));
        }

        if self.auth.jwt_secret == AuthConfig::default().jwt_secret {
            tracing::warn!("Using the built-in development JWT secret; set AGNOSIS_JWT_SECRET in production");
        }

        // bcrypt rejects costs outside 4..=31; anything above ~15 stalls logins
        if !(4..=15).contains(&self.auth.bcrypt_cost) {
            return Err(Error::config("bcrypt cost must be between 4 and 15"));
        }

        self.token_ttl()?;

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            _ => return Err(Error::config("Invalid log format (expected json or pretty)")),
        }

        Ok(())
    }

    /// Parsed token lifetime
    pub fn token_ttl(&self) -> Result<Duration> {
        parse_duration(&self.auth.token_ttl)
            .map_err(|e| Error::config(format!("Invalid token TTL: {}", e)))
    }
}

// Simple duration parser for common formats
fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    if let Some(ms) = s.strip_suffix("ms") {
        let ms: u64 = ms.parse().map_err(|_| "Invalid milliseconds".to_string())?;
        Ok(Duration::from_millis(ms))
    } else if let Some(secs) = s.strip_suffix('s') {
        let secs: u64 = secs.parse().map_err(|_| "Invalid seconds".to_string())?;
        Ok(Duration::from_secs(secs))
    } else if let Some(mins) = s.strip_suffix('m') {
        let mins: u64 = mins.parse().map_err(|_| "Invalid minutes".to_string())?;
        Ok(Duration::from_secs(mins * 60))
    } else if let Some(hours) = s.strip_suffix('h') {
        let hours: u64 = hours.parse().map_err(|_| "Invalid hours".to_string())?;
        Ok(Duration::from_secs(hours * 3600))
    } else {
        // Raw number of seconds
        let secs: u64 = s.parse().map_err(|_| "Invalid duration format".to_string())?;
        Ok(Duration::from_secs(secs))
    }
}
