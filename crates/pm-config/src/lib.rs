//! # pm-config
//!
//! Layered settings: built-in defaults, then an optional `postmortem.toml`
//! (or the file named by `POSTMORTEM_CONFIG`), then `POSTMORTEM__*`
//! environment variables. A `.env` file is loaded first if present.

use std::path::PathBuf;

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Placeholder secret used when none is configured.
pub const DEFAULT_SESSION_SECRET: &str = "change-me-in-production";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub site: SiteSettings,
    pub auth: AuthSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct StorageSettings {
    /// Directory holding stories.json, comments.json and users.json
    pub data_dir: PathBuf,
    /// Write sample stories at startup when the stories collection is empty
    pub seed_on_empty: bool,
}

#[derive(Debug, Deserialize)]
pub struct SiteSettings {
    pub name: String,
    pub static_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub session_secret: SecretString,
    pub session_ttl_hours: i64,
    pub min_password_len: usize,
    pub require_login_to_submit: bool,
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
    /// "pretty" or "json"
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Settings {
    /// Loads settings from `.env`, the config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let file = std::env::var("POSTMORTEM_CONFIG").unwrap_or_else(|_| "postmortem".to_string());
        Self::from_sources(Some(&file), true)
    }

    /// Builds settings from defaults, an optional file and (optionally) the
    /// process environment.
    pub fn from_sources(file: Option<&str>, use_env: bool) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("storage.data_dir", "data")?
            .set_default("storage.seed_on_empty", true)?
            .set_default("site.name", "YC Postmortem")?
            .set_default("site.static_dir", "static")?
            .set_default("auth.session_secret", DEFAULT_SESSION_SECRET)?
            .set_default("auth.session_ttl_hours", 168)?
            .set_default("auth.min_password_len", 8)?
            .set_default("auth.require_login_to_submit", false)?
            .set_default("log.filter", "info,tower_http=info")?
            .set_default("log.format", "pretty")?;

        if let Some(file) = file {
            builder = builder.add_source(File::with_name(file).required(false));
        }
        if use_env {
            builder = builder.add_source(
                Environment::with_prefix("POSTMORTEM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.session_secret.expose_secret().is_empty() {
            return Err(ConfigError::Invalid("auth.session_secret must not be empty".into()));
        }
        if self.auth.session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("auth.session_ttl_hours must be positive".into()));
        }
        Ok(())
    }

    /// True while sessions are signed with the built-in placeholder secret.
    pub fn uses_default_secret(&self) -> bool {
        self.auth.session_secret.expose_secret() == DEFAULT_SESSION_SECRET
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
