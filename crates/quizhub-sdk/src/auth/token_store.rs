//! Credential storage
//!
//! A [`TokenStore`] holds the access and refresh tokens between requests (and,
//! for the persistent backends, between runs). Stores are plain key/value
//! backends; the typed accessors are provided methods over the fixed keys in
//! [`quizhub_common::storage_keys`].
//!
//! Storage never fails from the caller's point of view: an unreadable or
//! unwritable backend degrades to "no token" and the problem is logged.

use parking_lot::{Mutex, RwLock};
use quizhub_common::storage_keys::{
    ACCESS_TOKEN_KEY, CREDENTIALS_FILE_NAME, DATA_DIR_NAME, KEYRING_SERVICE, REFRESH_TOKEN_KEY,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Synchronous key/value storage for credentials
pub trait TokenStore: Send + Sync {
    /// Read a value; `None` when absent or unreadable
    fn read(&self, key: &str) -> Option<String>;

    /// Write a value, silently degrading on failure
    fn write(&self, key: &str, value: &str);

    /// Remove a value, silently degrading on failure
    fn remove(&self, key: &str);

    /// Backend name for logging
    fn name(&self) -> &str;

    /// Current access token
    fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Replace the access token
    fn set_access_token(&self, token: &str) {
        self.write(ACCESS_TOKEN_KEY, token);
    }

    /// Forget the access token
    fn clear_access_token(&self) {
        self.remove(ACCESS_TOKEN_KEY);
    }

    /// Current refresh token
    fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Replace the refresh token; an empty token is ignored
    fn set_refresh_token(&self, token: &str) {
        if token.is_empty() {
            return;
        }
        self.write(REFRESH_TOKEN_KEY, token);
    }

    /// Forget the refresh token
    fn clear_refresh_token(&self) {
        self.remove(REFRESH_TOKEN_KEY);
    }

    /// Forget both tokens
    fn clear(&self) {
        self.clear_access_token();
        self.clear_refresh_token();
    }
}

/// In-process store; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with tokens
    pub fn with_tokens(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        let store = Self::new();
        store.set_access_token(&access_token.into());
        if let Some(refresh) = refresh_token {
            store.set_refresh_token(&refresh);
        }
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// JSON document on disk, one entry per storage key
///
/// The file is re-read on every access so that a login performed by another
/// process is visible immediately.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    /// Store credentials at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store credentials in the platform data directory
    /// (e.g. `~/.local/share/quizhub/credentials.json` on Linux)
    pub fn default_location() -> std::io::Result<Self> {
        Ok(Self::new(default_credentials_path()?))
    }

    /// Location of the credential document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> BTreeMap<String, String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read credentials from {}: {}", self.path.display(), e);
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring malformed credentials file {}: {}", self.path.display(), e);
            BTreeMap::new()
        })
    }

    fn save(&self, values: &BTreeMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) {
        let _guard = self.write_lock.lock();
        let mut values = self.load();
        apply(&mut values);
        if let Err(e) = self.save(&values) {
            warn!("Failed to write credentials to {}: {}", self.path.display(), e);
        }
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn write(&self, key: &str, value: &str) {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        });
    }

    fn remove(&self, key: &str) {
        self.update(|values| {
            values.remove(key);
        });
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Default path of the on-disk credential document
pub fn default_credentials_path() -> std::io::Result<PathBuf> {
    use etcetera::{choose_base_strategy, BaseStrategy};

    let strategy = choose_base_strategy().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Failed to determine base directories: {}", e),
        )
    })?;

    Ok(strategy
        .data_dir()
        .join(DATA_DIR_NAME)
        .join(CREDENTIALS_FILE_NAME))
}

/// OS credential store (Keychain, Secret Service, Credential Manager)
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Option<keyring::Entry> {
        match keyring::Entry::new(&self.service, key) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Keyring unavailable for {}/{}: {}", self.service, key, e);
                None
            }
        }
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl TokenStore for KeyringTokenStore {
    fn read(&self, key: &str) -> Option<String> {
        match self.entry(key)?.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!("Failed to read {} from keyring: {}", key, e);
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Some(entry) = self.entry(key) {
            if let Err(e) = entry.set_password(value) {
                warn!("Failed to write {} to keyring: {}", key, e);
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(entry) = self.entry(key) {
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {
                    debug!("Removed {} from keyring", key);
                }
                Err(e) => warn!("Failed to remove {} from keyring: {}", key, e),
            }
        }
    }

    fn name(&self) -> &str {
        "keyring"
    }
}
