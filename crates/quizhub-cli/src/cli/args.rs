use crate::cli::{commands::Commands, handlers};
use crate::config::CliConfig;
use crate::error::Result;
use clap::Parser;
use clap_verbosity_flag::{OffLevel, Verbosity};
use quizhub_common::ConfigLoader;
use std::path::PathBuf;

/// QuizHub CLI - Authenticated access to the QuizHub API
#[derive(Parser, Debug)]
#[command(
    name = "quizhub",
    author = "QuizHub Team",
    version,
    about = "QuizHub CLI - Authenticated access to the QuizHub API",
    long_about = "Command-line client for the QuizHub API.

SESSION:
  quizhub login -u <username>         # Log in and store tokens
  quizhub status                      # Show session state
  quizhub logout                      # Forget stored tokens

REQUESTS:
  quizhub request GET /quizzes        # Authenticated request
  quizhub request POST /answers --body '{\"questionId\":\"q1\"}'

CONFIGURATION:
  quizhub config show                 # Show effective configuration
  quizhub config path                 # Show configuration file location"
)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<OffLevel>,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let config_path = CliConfig::resolve_path(self.config.as_deref())?;
        let config = CliConfig::load(Some(config_path.clone()))?;

        match self.command {
            Commands::Login { username, password } => {
                handlers::auth::handle_login(&config, &username, password, self.json).await
            }
            Commands::Logout => handlers::auth::handle_logout(&config),
            Commands::Status => handlers::status::handle_status(&config, self.json),
            Commands::Request {
                method,
                path,
                body,
                raw,
            } => {
                handlers::request::handle_request(&config, &method, &path, body.as_deref(), raw)
                    .await
            }
            Commands::Config { action } => {
                handlers::config::handle_config(action, &config, &config_path, self.json)
            }
        }
    }
}
