//! Configuration command handlers

use crate::cli::commands::ConfigAction;
use crate::config::CliConfig;
use crate::error::Result;
use crate::output::{compress_path, json_output, print_info};
use std::path::Path;

/// Handle config subcommands
pub fn handle_config(
    action: ConfigAction,
    config: &CliConfig,
    config_path: &Path,
    json: bool,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            if json {
                return json_output(config);
            }
            if config_path.exists() {
                print_info(&format!("Configuration from {}", compress_path(config_path)));
            } else {
                print_info("No configuration file found; showing defaults and environment overrides");
            }
            println!();
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", compress_path(config_path));
            Ok(())
        }
    }
}
