//! Error types for the QuizHub CLI

use color_eyre::eyre::{eyre, Report};
use color_eyre::Section;
use thiserror::Error;

/// CLI error type with minimal variants
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file issues
    #[error("Configuration error: {0}")]
    Config(#[from] quizhub_common::ConfigurationError),

    /// API communication errors
    #[error("API error: {0}")]
    Api(#[from] quizhub_sdk::ApiError),

    /// Reading input or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Everything else (using color-eyre's Report for rich errors)
    #[error(transparent)]
    Internal(#[from] Report),
}

impl CliError {
    /// Wrap an ad-hoc message as an internal error
    pub fn internal(message: impl std::fmt::Display) -> Self {
        CliError::Internal(eyre!("{}", message))
    }

    /// Attach a hint that color-eyre prints below the error
    pub fn with_suggestion(self, suggestion: impl Into<String>) -> Self {
        let report = match self {
            CliError::Internal(report) => report,
            other => Report::new(other),
        };
        CliError::Internal(report.suggestion(suggestion.into()))
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(err) => CliError::Io(err),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Api(quizhub_sdk::ApiError::Serialization(err))
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
