//! Configuration loading shared by QuizHub components
//!
//! Configuration is layered with figment: serialized defaults first, then an
//! optional TOML file, then prefixed environment variables using `__` as the
//! nesting separator (`QUIZHUB_API__BASE_URL` sets `api.base_url`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The configuration could not be parsed or extracted
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    /// A configuration value failed validation
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// The configuration file could not be read or written
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Common loading behaviour for configuration structs
pub trait ConfigLoader<T> {
    /// Load configuration, merging the given file (if any) and the environment
    fn load(path: Option<PathBuf>) -> Result<T, ConfigurationError>;

    /// Load configuration from a specific file and the environment
    fn load_from_file(path: &Path) -> Result<T, ConfigurationError>;

    /// Re-apply environment overrides with the given prefix
    fn apply_env_overrides(config: &mut T, prefix: &str) -> Result<(), ConfigurationError>;
}

/// Build the standard figment stack: defaults, optional TOML file, prefixed env.
pub fn layered<T: Serialize>(defaults: &T, path: Option<&Path>, env_prefix: &str) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(defaults));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed(env_prefix).split("__"))
}

/// Extract a configuration struct from a figment, mapping the error
pub fn extract<T: DeserializeOwned>(figment: Figment) -> Result<T, ConfigurationError> {
    figment.extract().map_err(|e| ConfigurationError::ParseError {
        details: e.to_string(),
    })
}
