//! Layered configuration: built-in defaults, an optional TOML file, then
//! `AVIEL_*` environment variables (nested keys joined with `__`, e.g.
//! `AVIEL_BACKEND__ANON_KEY`).

use crate::contact::ContactConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "aviel.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub contact: ContactConfig,
}

/// Hosted backend endpoint, key and collection names
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://abcd.supabase.co`
    pub url: String,
    /// Public anon key sent as `apikey` on every request
    pub anon_key: String,
    pub flights_table: String,
    pub packages_table: String,
    pub leads_table: String,
    pub banners_table: String,
    pub banner_bucket: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            flights_table: "offers_flights".to_string(),
            packages_table: "offers_packages".to_string(),
            leads_table: "leads".to_string(),
            banners_table: "home_banners".to_string(),
            banner_bucket: "public-banners".to_string(),
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "backend.url",
                reason: "must be set (AVIEL_BACKEND__URL)".to_string(),
            });
        }
        if self.anon_key.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "backend.anon_key",
                reason: "must be set (AVIEL_BACKEND__ANON_KEY)".to_string(),
            });
        }
        Ok(())
    }
}

impl Config {
    /// Load from `path` (or `aviel.toml` if absent) layered under the
    /// environment. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        debug!(path = %path.display(), "Loading configuration");

        let config: Config = Self::figment(path).extract()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("AVIEL_").split("__"))
    }
}
