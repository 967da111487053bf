//! QuizHub SDK for Rust
//!
//! Authenticated HTTP access to the QuizHub API. Every call attaches the
//! stored bearer token, renews it once when the server rejects it, and
//! backs off when the server is rate limiting or unavailable.

pub mod auth;
pub mod client;
pub mod error;
pub mod executor;
pub mod retry;
pub mod types;

pub use auth::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, RotationPolicy, SessionExpiredHook,
    SessionStatus, TokenStore,
};
pub use client::{ApiClient, ClientBuilder};
pub use error::{ApiError, HttpError, Result};
pub use executor::RequestOptions;
pub use retry::RetryPolicy;
pub use types::{unwrap_data, LoginOutcome, SessionUser};

/// Re-exported so callers can name methods without depending on reqwest
pub use reqwest::Method;
