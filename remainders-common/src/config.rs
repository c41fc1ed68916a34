//! Configuration loading
//!
//! Bootstrap configuration comes from a TOML file, then environment variables
//! override individual fields:
//!
//! 1. Environment variables (`APP_DB_URI`, `APP_PORT`, ...)
//! 2. TOML configuration file
//! 3. Built-in defaults (code constants)
//!
//! A missing TOML file is not an error; defaults are used. A TOML file that
//! exists but does not parse is.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::resolve::roles::{default_role_entries, DEFAULT_ANONYMOUS_KEY};
use crate::resolve::{FanoutEngine, Placeholder, RoleEntry, RolePolicy, RoleTable};
use crate::source::ConnectRetry;
use crate::{Error, Result};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5740;

/// Default request timeout for the HTTP layer
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 240;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// sqlx connection URL of the record database
    pub database_url: String,

    /// Listen address
    pub bind: String,

    pub port: u16,

    /// CORS origins allowed to call the API
    pub allowed_origins: Vec<String>,

    /// Verbose diagnostics (debug-level logging unless RUST_LOG says otherwise)
    pub debug: bool,

    /// API shared secret; 0 disables authentication
    pub shared_secret: i64,

    pub request_timeout_secs: u64,

    pub logging: LoggingConfig,

    pub connect: ConnectConfig,

    pub resolution: ResolutionConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

/// Database connection retry settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    pub attempts: u32,
    pub delay_secs: u64,
}

/// Recipient resolution settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Role detection policy
    pub policy: RolePolicy,

    /// Role key used for anonymous recipients
    pub anonymous_key: String,

    /// Placeholder override; defaults per policy
    pub placeholder: Option<Placeholder>,

    /// Role → slug prefix table, in detection order
    pub roles: Vec<RoleEntry>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://remainders.db?mode=ro".to_string(),
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            allowed_origins: Vec::new(),
            debug: false,
            shared_secret: 0,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            logging: LoggingConfig::default(),
            connect: ConnectConfig::default(),
            resolution: ResolutionConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Default for ConnectConfig {
    fn default() -> Self {
        let retry = ConnectRetry::default();
        Self {
            attempts: retry.attempts,
            delay_secs: retry.delay.as_secs(),
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            policy: RolePolicy::default(),
            anonymous_key: DEFAULT_ANONYMOUS_KEY.to_string(),
            placeholder: None,
            roles: default_role_entries(),
        }
    }
}

impl ConnectConfig {
    pub fn retry(&self) -> ConnectRetry {
        ConnectRetry {
            attempts: self.attempts,
            delay: Duration::from_secs(self.delay_secs),
        }
    }
}

impl ResolutionConfig {
    /// Immutable role table from the configured entries
    pub fn role_table(&self) -> Result<RoleTable> {
        RoleTable::new(self.roles.clone(), self.anonymous_key.clone())
    }

    /// Effective placeholder (override or the policy default)
    pub fn placeholder(&self) -> Placeholder {
        self.placeholder
            .clone()
            .unwrap_or_else(|| Placeholder::for_policy(self.policy))
    }

    /// Fan-out engine for this configuration
    pub fn build_engine(&self) -> Result<FanoutEngine> {
        FanoutEngine::new(
            Arc::new(self.role_table()?),
            Arc::from(self.policy.detector()),
            self.placeholder(),
        )
    }
}

impl TomlConfig {
    /// Load from `path`, then apply environment overrides and validate
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)?
        } else {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content (no overrides, no validation)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("invalid TOML: {}", e)))
    }

    /// Apply `APP_*` overrides using `lookup` to read variables
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("APP_DB_URI") {
            self.database_url = url;
        }
        if let Some(bind) = lookup("APP_BIND") {
            self.bind = bind;
        }
        if let Some(port) = lookup("APP_PORT") {
            self.port = port
                .parse()
                .map_err(|_| Error::Config(format!("APP_PORT is not a port number: {}", port)))?;
        }
        if let Some(origins) = lookup("APP_ALLOWED_ORIGINS") {
            self.allowed_origins = split_origins(&origins)?;
        }
        if let Some(debug) = lookup("APP_DEBUG") {
            self.debug = debug == "true";
        }
        if let Some(secret) = lookup("APP_SHARED_SECRET") {
            self.shared_secret = secret
                .parse()
                .map_err(|_| Error::Config("APP_SHARED_SECRET is not an i64".to_string()))?;
        }
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            return Err(Error::Config("database_url must not be empty".to_string()));
        }
        for origin in &self.allowed_origins {
            validate_origin(origin)?;
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".to_string()));
        }
        self.resolution.build_engine()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `bind:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Split a comma separated origin list, validating each entry
pub fn split_origins(value: &str) -> Result<Vec<String>> {
    let origins: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    for origin in &origins {
        validate_origin(origin)?;
    }
    Ok(origins)
}

/// URIs must be http(s); bare values without a scheme are left to the CORS layer
fn validate_origin(origin: &str) -> Result<()> {
    if let Some((scheme, _)) = origin.split_once("://") {
        if scheme != "http" && scheme != "https" {
            return Err(Error::Config(format!("malformed origin uri: {}", origin)));
        }
    }
    Ok(())
}
