//! Application configuration.
//!
//! Lowest to highest precedence: built-in defaults, JSON config file,
//! `.env` file, process environment. `.env` is loaded into the process
//! environment before the overrides are applied and never replaces
//! variables that are already set.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use usd1_alerts::TelegramConfig;
use usd1_feeds::{HttpConfig, RetryPolicy, DEFAULT_STABLECOINS};

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub telegram: TelegramSettings,
    pub api_keys: ApiKeys,
    pub http: HttpSettings,
    /// Stablecoins listed in the market-cap table, in order.
    pub stablecoin_symbols: Vec<String>,
    /// Asset tracked by the lending and volume sections.
    pub target_symbol: String,
    /// Send a failure notice when no source returns data.
    pub notify_on_failure: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramSettings::default(),
            api_keys: ApiKeys::default(),
            http: HttpSettings::default(),
            stablecoin_symbols: DEFAULT_STABLECOINS.iter().map(|s| s.to_string()).collect(),
            target_symbol: "USD1".to_string(),
            notify_on_failure: true,
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub coinmarketcap: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("coinmarketcap", &self.coinmarketcap.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Extra attempts for transient failures.
    pub max_retries: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            max_retries: 0,
        }
    }
}

/// Treat empty strings as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name,
        value: value.to_string(),
    })
}

impl AppConfig {
    /// Load the JSON file (if any) and apply environment overrides.
    ///
    /// An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from `lookup` (the process environment in production).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = non_empty(lookup("TELEGRAM_BOT_TOKEN")) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat_id) = non_empty(lookup("TELEGRAM_CHAT_ID")) {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(key) = non_empty(lookup("CMC_API_KEY")) {
            self.api_keys.coinmarketcap = Some(key);
        }
        if let Some(value) = non_empty(lookup("REPORT_HTTP_TIMEOUT_SECS")) {
            self.http.timeout_secs = parse_env("REPORT_HTTP_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = non_empty(lookup("REPORT_MAX_RETRIES")) {
            self.http.max_retries = parse_env("REPORT_MAX_RETRIES", &value)?;
        }
        if let Some(value) = non_empty(lookup("REPORT_STABLECOINS")) {
            self.stablecoin_symbols = value
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        Ok(())
    }

    /// Check the settings needed for a run. Credentials are optional for dry runs.
    pub fn validate(&self, dry_run: bool) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid("http.timeout_secs must be positive".to_string()));
        }
        if self.target_symbol.trim().is_empty() {
            return Err(ConfigError::Missing("target_symbol"));
        }
        if self.stablecoin_symbols.is_empty() {
            return Err(ConfigError::Missing("stablecoin_symbols"));
        }
        if !dry_run {
            self.telegram_config()?;
        }
        Ok(())
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout: self.timeout(),
            retry: RetryPolicy::with_max_retries(self.http.max_retries),
            ..HttpConfig::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn telegram_config(&self) -> Result<TelegramConfig, ConfigError> {
        let token = non_empty(self.telegram.bot_token.clone())
            .ok_or(ConfigError::Missing("telegram.bot_token (TELEGRAM_BOT_TOKEN)"))?;
        let chat_id = non_empty(self.telegram.chat_id.clone())
            .ok_or(ConfigError::Missing("telegram.chat_id (TELEGRAM_CHAT_ID)"))?;
        Ok(TelegramConfig::new(token, chat_id))
    }
}
