//! Authentication module for the QuizHub SDK
//!
//! Credential storage, token payloads and single-flight token refresh.

pub mod refresh;
pub mod token_store;
pub mod types;

pub use refresh::{RefreshCoordinator, RotationPolicy, SessionExpiredHook, REFRESH_PATH};
pub use token_store::{
    default_credentials_path, FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore,
};
pub use types::{jwt_expiry, AuthTokens, SessionStatus};
