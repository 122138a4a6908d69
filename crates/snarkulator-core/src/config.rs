//! Gateway configuration.
//!
//! Precedence (lowest to highest): built-in defaults, TOML file (`SNARKULATOR_CONFIG`,
//! default `config/gateway.toml`), `SNARKULATOR__*` environment variables, then the
//! plain `PORT` / `GEMINI_API_KEY` / `GOOGLE_AI_API_KEY` variables.
//!
//! | Key | Default |
//! |-----|---------|
//! | host | 0.0.0.0 |
//! | port | 3000 |
//! | gemini_model | gemini-2.5-pro |
//! | gemini_base_url | https://generativelanguage.googleapis.com |
//! | request_timeout_secs | 60 |
//! | history_window | 5 |
//! | default_list_limit | 10 |
//! | static_dir | (none) |

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/gateway.toml";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Never serialized back out (status endpoints, logs).
    #[serde(default, skip_serializing)]
    pub gemini_api_key: Option<String>,
    pub request_timeout_secs: u64,
    /// Calculations quoted to the model as history on each request.
    pub history_window: usize,
    /// `GET /api/calculations` page size when `limit` is absent or invalid.
    pub default_list_limit: usize,
    /// Built web client to serve at `/`. Ignored when the directory is missing.
    #[serde(default)]
    pub static_dir: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_api_key: None,
            request_timeout_secs: 60,
            history_window: 5,
            default_list_limit: 10,
            static_dir: None,
        }
    }
}

impl GatewayConfig {
    /// Full load: file + prefixed env, then the well-known plain env overrides.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("SNARKULATOR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Ok(Self::load_from_path(Path::new(&config_path))?.with_env_overrides())
    }

    /// Defaults, then the TOML file at `path` if it exists, then `SNARKULATOR__*` env.
    pub fn load_from_path(path: &Path) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("gemini_model", defaults.gemini_model)?
            .set_default("gemini_base_url", defaults.gemini_base_url)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("history_window", defaults.history_window as i64)?
            .set_default("default_list_limit", defaults.default_list_limit as i64)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        builder
            .add_source(config::Environment::with_prefix("SNARKULATOR").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// `PORT` and the Gemini key variables win over everything else.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.trim().parse().ok()) {
            self.port = port;
        }
        if let Some(key) = api_key_from_env() {
            self.gemini_api_key = Some(key);
        }
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn has_api_key(&self) -> bool {
        self.gemini_api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

/// `GEMINI_API_KEY`, falling back to `GOOGLE_AI_API_KEY`. Blank values count as unset.
pub fn api_key_from_env() -> Option<String> {
    ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
