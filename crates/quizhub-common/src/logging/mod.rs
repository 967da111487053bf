//! Logging initialisation for QuizHub binaries
//!
//! Filter resolution, first match wins:
//! 1. `-v`/`-q` flags, applied to the QuizHub crates only
//! 2. `QUIZHUB_LOG`, a full `EnvFilter` directive string
//! 3. `RUST_LOG`
//! 4. The verbosity's default level, applied like the flags
//!
//! Levels derived from flags or the default never make the HTTP stack
//! louder than `warn`.

use anyhow::Result;
use clap_verbosity_flag::{LogLevel, Verbosity};
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Project-specific filter variable; takes precedence over `RUST_LOG`
pub const LOG_ENV_VAR: &str = "QUIZHUB_LOG";

/// Targets the verbosity flags control
pub const QUIZHUB_TARGETS: &[&str] = &["quizhub", "quizhub_cli", "quizhub_sdk", "quizhub_common"];

/// HTTP stack targets capped at `warn` unless a filter variable says otherwise
pub const HTTP_STACK_TARGETS: &[&str] = &["hyper", "h2", "reqwest", "rustls"];

/// Directive string that sets `level` for QuizHub crates and caps the HTTP stack
pub fn directives_for(level: LevelFilter) -> String {
    let dependency_level = level.min(LevelFilter::WARN);
    QUIZHUB_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .chain(
            HTTP_STACK_TARGETS
                .iter()
                .map(|target| format!("{target}={dependency_level}")),
        )
        .collect::<Vec<_>>()
        .join(",")
}

fn level_filter(level: clap_verbosity_flag::LevelFilter) -> LevelFilter {
    match level {
        clap_verbosity_flag::LevelFilter::Off => LevelFilter::OFF,
        clap_verbosity_flag::LevelFilter::Error => LevelFilter::ERROR,
        clap_verbosity_flag::LevelFilter::Warn => LevelFilter::WARN,
        clap_verbosity_flag::LevelFilter::Info => LevelFilter::INFO,
        clap_verbosity_flag::LevelFilter::Debug => LevelFilter::DEBUG,
        clap_verbosity_flag::LevelFilter::Trace => LevelFilter::TRACE,
    }
}

/// Pick the directive string from the flag level and the filter variables
fn resolve_directives(
    flag_level: Option<LevelFilter>,
    quizhub_log: Option<String>,
    rust_log: Option<String>,
    default_level: LevelFilter,
) -> String {
    if let Some(level) = flag_level {
        return directives_for(level);
    }
    let set = |value: Option<String>| value.filter(|directives| !directives.trim().is_empty());
    set(quizhub_log)
        .or_else(|| set(rust_log))
        .unwrap_or_else(|| directives_for(default_level))
}

/// Build the filter for the given verbosity flags and environment
pub fn build_filter<L: LogLevel>(verbosity: &Verbosity<L>) -> Result<EnvFilter> {
    let level = level_filter(verbosity.log_level_filter());
    let directives = resolve_directives(
        verbosity.is_present().then_some(level),
        std::env::var(LOG_ENV_VAR).ok(),
        std::env::var("RUST_LOG").ok(),
        level,
    );
    Ok(EnvFilter::try_new(directives)?)
}

/// Install the global subscriber, writing compact lines to stderr.
///
/// Event targets are shown from `debug` upwards, where the crate an event
/// came from starts to matter.
///
/// # Example
///
/// ```no_run
/// use clap::Parser;
/// use clap_verbosity_flag::{Verbosity, WarnLevel};
/// use quizhub_common::logging;
///
/// #[derive(Parser)]
/// struct Args {
///     #[clap(flatten)]
///     verbosity: Verbosity<WarnLevel>,
/// }
///
/// let args = Args::parse();
/// logging::init_logging(&args.verbosity).unwrap();
/// ```
pub fn init_logging<L: LogLevel>(verbosity: &Verbosity<L>) -> Result<()> {
    let filter = build_filter(verbosity)?;
    let show_targets = filter
        .max_level_hint()
        .is_some_and(|level| level >= LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(show_targets)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use clap_verbosity_flag::WarnLevel;

    #[derive(Parser)]
    struct Args {
        #[clap(flatten)]
        verbosity: Verbosity<WarnLevel>,
    }

    #[test]
    fn test_directives_cap_http_stack_at_warn() {
        let directives = directives_for(LevelFilter::TRACE);
        assert!(directives.contains("quizhub_sdk=trace"));
        assert!(directives.contains("quizhub_cli=trace"));
        assert!(directives.contains("hyper=warn"));
        assert!(directives.contains("reqwest=warn"));
    }

    #[test]
    fn test_quiet_levels_also_quiet_http_stack() {
        let directives = directives_for(LevelFilter::ERROR);
        assert!(directives.contains("quizhub_sdk=error"));
        assert!(directives.contains("hyper=error"));
        assert!(!directives.contains("warn"));
    }

    #[test]
    fn test_flags_win_over_environment() {
        let directives = resolve_directives(
            Some(LevelFilter::DEBUG),
            Some("quizhub_sdk=trace".to_string()),
            Some("info".to_string()),
            LevelFilter::WARN,
        );
        assert_eq!(directives, directives_for(LevelFilter::DEBUG));
    }

    #[test]
    fn test_quizhub_log_wins_over_rust_log() {
        let directives = resolve_directives(
            None,
            Some("quizhub_sdk::retry=debug".to_string()),
            Some("info".to_string()),
            LevelFilter::WARN,
        );
        assert_eq!(directives, "quizhub_sdk::retry=debug");

        let directives = resolve_directives(None, None, Some("info".to_string()), LevelFilter::WARN);
        assert_eq!(directives, "info");
    }

    #[test]
    fn test_blank_environment_is_ignored() {
        let directives = resolve_directives(None, Some("  ".to_string()), None, LevelFilter::WARN);
        assert_eq!(directives, directives_for(LevelFilter::WARN));

        let directives = resolve_directives(
            None,
            Some(String::new()),
            Some("debug".to_string()),
            LevelFilter::WARN,
        );
        assert_eq!(directives, "debug");
    }

    #[test]
    fn test_verbose_flags_raise_quizhub_level_only() {
        let args = Args::parse_from(["quizhub", "-vv"]);
        let filter = build_filter(&args.verbosity).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_quiet_flag_lowers_level() {
        let args = Args::parse_from(["quizhub", "-q"]);
        let filter = build_filter(&args.verbosity).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }
}
