//! Command handlers for the QuizHub CLI

pub mod auth;
pub mod config;
pub mod request;
pub mod status;

use crate::config::{CliConfig, TokenStoreKind};
use crate::error::{CliError, Result};
use crate::output::print_error;
use quizhub_sdk::{
    ApiClient, FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Open the credential store selected in the configuration
pub fn open_token_store(config: &CliConfig) -> Result<Arc<dyn TokenStore>> {
    let store: Arc<dyn TokenStore> = match config.auth.token_store {
        TokenStoreKind::File => match &config.auth.credentials_path {
            Some(path) => Arc::new(FileTokenStore::new(crate::config::expand_path(path))),
            None => Arc::new(FileTokenStore::default_location().map_err(|e| {
                CliError::internal(format!("Failed to locate credentials file: {e}"))
            })?),
        },
        TokenStoreKind::Keyring => Arc::new(KeyringTokenStore::new(&config.auth.keyring_service)),
        TokenStoreKind::Memory => Arc::new(MemoryTokenStore::new()),
    };
    debug!("Using {} token store", store.name());
    Ok(store)
}

/// Build an API client from the configuration
pub fn build_client(config: &CliConfig) -> Result<ApiClient> {
    let client = ApiClient::builder()
        .base_url(&config.api.base_url)
        .timeout(Duration::from_secs(config.api.timeout_secs))
        .token_store(open_token_store(config)?)
        .retry_policy(config.retry.to_policy())
        .rotation_policy(config.auth.rotation)
        .on_session_expired(|| {
            print_error("Your session has expired. Run 'quizhub login' to sign in again.")
        })
        .build()?;
    Ok(client)
}
