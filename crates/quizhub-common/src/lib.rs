//! # QuizHub Common
//!
//! Pieces shared by every QuizHub client crate:
//! - logging initialisation for binaries
//! - the configuration loading trait and its error type
//! - storage key constants used by token stores

pub mod config;
pub mod logging;
pub mod storage_keys;

pub use config::{ConfigLoader, ConfigurationError};
