//! # QuizHub CLI
//!
//! Command-line client for the QuizHub API: session management and
//! authenticated requests on top of `quizhub-sdk`.
//!
//! ## Architecture
//!
//! - Clap-based argument parsing with derive macros
//! - Handler-based command processing
//! - Layered configuration (defaults, TOML file, `QUIZHUB_` environment)

pub mod cli;
pub mod config;
pub mod error;
pub mod output;

pub use cli::*;
pub use error::*;
