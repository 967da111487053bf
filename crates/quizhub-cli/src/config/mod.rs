//! Configuration management for the QuizHub CLI

use crate::error::{CliError, Result};
use etcetera::{choose_base_strategy, BaseStrategy};
use quizhub_common::config::{extract, layered};
use quizhub_common::storage_keys::{DATA_DIR_NAME, KEYRING_SERVICE};
use quizhub_common::{ConfigLoader, ConfigurationError};
use quizhub_sdk::{RetryPolicy, RotationPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable prefix; `QUIZHUB_API__BASE_URL` sets `api.base_url`
pub const ENV_PREFIX: &str = "QUIZHUB_";

/// CLI configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    /// API configuration
    pub api: ApiConfig,

    /// Retry and backoff configuration
    pub retry: RetryConfig,

    /// Credential storage and refresh behaviour
    pub auth: AuthConfig,
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL for the QuizHub API
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Backoff for 429/503 responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            max_jitter_ms: policy.max_jitter.as_millis() as u64,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
        }
    }
}

/// Where tokens are kept between runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStoreKind {
    /// JSON file in the data directory
    #[default]
    File,
    /// Operating system keyring
    Keyring,
    /// Process memory only; nothing survives the command
    Memory,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub token_store: TokenStoreKind,

    pub rotation: RotationPolicy,

    /// Service name used for keyring entries
    pub keyring_service: String,

    /// Override for the credentials file location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_store: TokenStoreKind::default(),
            rotation: RotationPolicy::default(),
            keyring_service: KEYRING_SERVICE.to_string(),
            credentials_path: None,
        }
    }
}

impl CliConfig {
    /// Default config file location (`~/.config/quizhub/config.toml` on Linux)
    pub fn default_config_path() -> Result<PathBuf> {
        let strategy = choose_base_strategy()
            .map_err(|e| CliError::internal(format!("Failed to determine home directory: {e}")))?;
        Ok(strategy.config_dir().join(DATA_DIR_NAME).join("config.toml"))
    }

    /// Resolve the config path from the `--config` flag, expanding `~`
    pub fn resolve_path(flag: Option<&Path>) -> Result<PathBuf> {
        match flag {
            Some(path) => Ok(expand_path(path)),
            None => Self::default_config_path(),
        }
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        url::Url::parse(&self.api.base_url).map_err(|e| ConfigurationError::InvalidValue {
            key: "api.base_url".into(),
            reason: e.to_string(),
        })?;
        if self.retry.max_attempts == 0 {
            return Err(ConfigurationError::InvalidValue {
                key: "retry.max_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigurationError::InvalidValue {
                key: "api.timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::internal(format!("Failed to render configuration: {e}")))
    }
}

impl ConfigLoader<CliConfig> for CliConfig {
    fn load(path: Option<PathBuf>) -> std::result::Result<CliConfig, ConfigurationError> {
        // A missing file is fine; defaults and the environment still apply
        let path = path.filter(|p| p.exists());
        debug!("Loading configuration from {:?}", path);

        let config: CliConfig = extract(layered(&CliConfig::default(), path.as_deref(), ENV_PREFIX))?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> std::result::Result<CliConfig, ConfigurationError> {
        if !path.exists() {
            return Err(ConfigurationError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Config file not found: {}", path.display()),
            )));
        }
        Self::load(Some(path.to_path_buf()))
    }

    fn apply_env_overrides(
        config: &mut CliConfig,
        prefix: &str,
    ) -> std::result::Result<(), ConfigurationError> {
        *config = extract(layered(&*config, None, prefix))?;
        config.validate()
    }
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}
