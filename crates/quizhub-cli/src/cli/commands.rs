use clap::Subcommand;

/// Main CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session tokens
    Login {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password (prompted for when omitted)
        #[arg(short, long, env = "QUIZHUB_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored session state
    Status,

    /// Send an authenticated request to the API
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,

        /// Path relative to the API base URL, e.g. /quizzes
        path: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,

        /// Print the response without unwrapping the `data` envelope
        #[arg(long)]
        raw: bool,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print the configuration file location
    Path,
}
