//! # configs
//!
//! Layered runtime configuration for threadline.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. `config/threadline.toml` (optional, path overridable via `THREADLINE_CONFIG`)
//! 3. environment variables prefixed `THREADLINE__`, e.g. `THREADLINE__SERVER__PORT=9000`
//!
//! A `.env` file in the working directory is loaded into the environment first.

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub auth: AuthSettings,
    pub comments: CommentSettings,
    pub notifications: NotificationSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// Postgres connection string; in-memory storage is used when absent
    pub url: Option<SecretString>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct RedisSettings {
    /// Redis connection string; an in-process cache is used when absent
    pub url: Option<SecretString>,
    pub key_prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: Option<SecretString>,
    pub token_ttl_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentSettings {
    pub edit_window_secs: i64,
    pub restore_window_secs: i64,
    pub max_content_chars: usize,
    pub cache_key: String,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Settings {
    /// Loads `.env`, then the layered sources.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env"),
        }
        let file = std::env::var("THREADLINE_CONFIG").unwrap_or_else(|_| "config/threadline".into());
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(&file).required(false))
                .add_source(
                    Environment::with_prefix("THREADLINE")
                        .prefix_separator("__")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    /// Loads defaults overlaid with a TOML document. Used by tests and tools.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder().add_source(File::from_str(toml, config::FileFormat::Toml)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = with_defaults(builder)?.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks cross-field rules and the secrets required by enabled backends.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.comments.edit_window_secs <= 0 || self.comments.restore_window_secs <= 0 {
            return Err(ConfigError::Invalid("comment windows must be positive".into()));
        }
        if self.comments.max_content_chars == 0 {
            return Err(ConfigError::Invalid("comments.max_content_chars must be > 0".into()));
        }
        if self.notifications.queue_capacity == 0 {
            return Err(ConfigError::Invalid("notifications.queue_capacity must be > 0".into()));
        }
        if cfg!(feature = "auth-jwt") && self.auth.jwt_secret.is_none() {
            return Err(ConfigError::Invalid("auth.jwt_secret is required".into()));
        }
        if cfg!(feature = "db-postgres") && self.database.url.is_none() {
            tracing::warn!("database.url not set; comments will live in memory only");
        }
        if cfg!(feature = "redis") && self.redis.url.is_none() {
            tracing::warn!("redis.url not set; using the in-process comment cache");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// Applies the built-in defaults underneath whatever sources the builder
// already carries.
fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("database.max_connections", 10)?
        .set_default("redis.key_prefix", "threadline")?
        .set_default("auth.token_ttl_secs", 24 * 3600)?
        .set_default("comments.edit_window_secs", 15 * 60)?
        .set_default("comments.restore_window_secs", 15 * 60)?
        .set_default("comments.max_content_chars", 2000)?
        .set_default("comments.cache_key", "comments:all")?
        .set_default("comments.cache_ttl_secs", 300)?
        .set_default("notifications.queue_capacity", 1024)?
        .set_default("log.format", "pretty")?
        .set_default("log.filter", "info")?)
}
