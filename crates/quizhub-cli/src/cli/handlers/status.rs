//! Session status handler

use crate::cli::handlers::build_client;
use crate::config::CliConfig;
use crate::error::Result;
use crate::output::{json_output, print_field, print_info, print_success};
use quizhub_sdk::SessionStatus;

/// Handle status command
pub fn handle_status(config: &CliConfig, json: bool) -> Result<()> {
    let client = build_client(config)?;
    let status = client.session_status();

    if json {
        return json_output(&status);
    }

    match &status {
        SessionStatus::Anonymous => {
            print_info("Not logged in. Run 'quizhub login' to sign in.");
        }
        SessionStatus::Active {
            expires_at,
            can_refresh,
        } => {
            print_success("Logged in");
            if let Some(expires_at) = expires_at {
                print_field("Expires", &expires_at.to_rfc3339());
            }
            print_field("Refresh token", if *can_refresh { "stored" } else { "none" });
        }
        SessionStatus::Expired {
            expires_at,
            can_refresh,
        } => {
            print_info(&format!("Access token expired at {}", expires_at.to_rfc3339()));
            if *can_refresh {
                print_field("Refresh token", "stored; the next request will renew the session");
            } else {
                print_field("Refresh token", "none; run 'quizhub login'");
            }
        }
    }
    print_field("API", client.base_url());
    print_field("Store", client.token_store().name());
    Ok(())
}
