//! Authentication command handlers

use crate::cli::handlers::build_client;
use crate::config::CliConfig;
use crate::error::{CliError, Result};
use crate::output::{json_output, print_info, print_success};
use serde_json::json;
use tracing::debug;

/// Handle login command
pub async fn handle_login(
    config: &CliConfig,
    username: &str,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    debug!("Starting login for {}", username);

    let password = match password {
        Some(password) => password,
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()?,
    };

    let client = build_client(config)?;
    let outcome = client.login(username, &password).await.map_err(|e| {
        let rejected = e.requires_reauthentication();
        let err = CliError::from(e);
        if rejected {
            err.with_suggestion("Check your username and password")
        } else {
            err
        }
    })?;

    if json {
        return json_output(&json!({
            "username": username,
            "user": outcome.user,
            "refreshable": outcome.refreshable,
        }));
    }

    let display_name = outcome
        .user
        .as_ref()
        .and_then(|u| u.name.clone())
        .unwrap_or_else(|| username.to_string());
    print_success(&format!("Logged in as {display_name}"));
    if !outcome.refreshable {
        print_info("The server issued no refresh token; you will need to log in again when the session expires");
    }
    Ok(())
}

/// Handle logout command
pub fn handle_logout(config: &CliConfig) -> Result<()> {
    let client = build_client(config)?;
    client.logout();
    print_success("Logged out");
    Ok(())
}
