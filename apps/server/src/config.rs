//! # Server Configuration
//!
//! Process-level settings: where to listen, which database file to open,
//! how to sign tokens and how patient to be with the reminder webhook.
//! Business settings (VAT rate, prefixes, webhook URL) live in the
//! database and are edited through `/api/settings`.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PARLOUR_PORT=9000                                                  │
//! │     PARLOUR_DB_PATH=/var/lib/parlour/parlour.db                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $PARLOUR_CONFIG, or                                                │
//! │     ~/.config/parlour/parlour.toml (Linux)                             │
//! │     ~/Library/Application Support/uk.parlour.parlour/parlour.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//! cors_origins = ["http://localhost:5173"]
//!
//! [database]
//! path = "/var/lib/parlour/parlour.db"
//! max_connections = 5
//!
//! [auth]
//! jwt_secret = "a long random string"
//! token_ttl_secs = 43200
//!
//! [notifications]
//! webhook_timeout_secs = 10
//! max_attempts = 3
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Signing secret used when none is configured. Startup logs a warning
/// while it is in use.
pub const DEV_JWT_SECRET: &str = "parlour-dev-secret-change-in-production";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[server]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Browser origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// `[database]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// `[auth]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Access token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

/// `[notifications]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Per-attempt timeout for the reminder webhook.
    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_secs: u64,

    /// Attempts before a reminder is reported as failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> PathBuf {
    PathBuf::from("parlour.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_token_ttl() -> i64 {
    12 * 60 * 60
}

fn default_webhook_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: default_jwt_secret(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            webhook_timeout_secs: default_webhook_timeout(),
            max_attempts: default_max_attempts(),
        }
    }
}

// =============================================================================
// Server Config
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`parlour.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let path = config_path
            .or_else(|| std::env::var_os("PARLOUR_CONFIG").map(PathBuf::from))
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(?path, "Loading server config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        if config.auth.jwt_secret == DEV_JWT_SECRET {
            warn!("Using the development JWT secret; set PARLOUR_JWT_SECRET in production");
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies `PARLOUR_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("PARLOUR_BIND_ADDR") {
            debug!(addr = %addr, "Overriding bind address from environment");
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("PARLOUR_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PARLOUR_PORT".to_string()))?;
        }

        if let Some(path) = lookup("PARLOUR_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(secret) = lookup("PARLOUR_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(ttl) = lookup("PARLOUR_TOKEN_TTL_SECS") {
            self.auth.token_ttl_secs = ttl
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PARLOUR_TOKEN_TTL_SECS".to_string()))?;
        }

        if let Some(timeout) = lookup("PARLOUR_WEBHOOK_TIMEOUT_SECS") {
            self.notifications.webhook_timeout_secs = timeout.parse().map_err(|_| {
                ConfigError::InvalidValue("PARLOUR_WEBHOOK_TIMEOUT_SECS".to_string())
            })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.socket_addr()?;

        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".into()));
        }
        if self.auth.token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid(
                "auth.token_ttl_secs must be greater than 0".into(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.notifications.webhook_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "notifications.webhook_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.notifications.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "notifications.max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> ConfigResult<SocketAddr> {
        format!("{}:{}", self.server.bind_addr, self.server.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("server.bind_addr".to_string()))
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("uk", "parlour", "parlour")
            .map(|dirs| dirs.config_dir().join("parlour.toml"))
    }
}
