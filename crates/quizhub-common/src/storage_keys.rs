//! Fixed storage keys for persisted credentials
//!
//! Every token store writes the two credentials under these keys so that a
//! session saved by one client can be picked up by another.

/// Key under which the access token is stored
pub const ACCESS_TOKEN_KEY: &str = "app:token";

/// Key under which the refresh token is stored
pub const REFRESH_TOKEN_KEY: &str = "app:refresh";

/// Directory name used below the platform data directory
pub const DATA_DIR_NAME: &str = "quizhub";

/// File name of the on-disk credential document
pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Default service name for OS keyring entries
pub const KEYRING_SERVICE: &str = "quizhub";
