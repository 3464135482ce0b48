//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueEnum};
use eventslot_core::{TracingConfig, TracingOutputFormat};
use tracing::Level;

/// eventslot - expand recurring events into dated slots
#[derive(Debug, Parser)]
#[command(name = "eventslot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "EVENTSLOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    /// Builds the subscriber settings for this format, at debug level when
    /// `debug` is set and warnings only otherwise.
    pub fn tracing_config(self, debug: bool) -> TracingConfig {
        let level = if debug { Level::DEBUG } else { Level::WARN };
        match self {
            Self::Json => TracingConfig::json().with_level(level),
            Self::Compact if debug => TracingConfig::cli_debug(),
            Self::Compact => TracingConfig::quiet(),
            Self::Pretty if debug => {
                TracingConfig::cli_debug().with_format(TracingOutputFormat::Pretty)
            }
            Self::Pretty => TracingConfig::quiet().with_format(TracingOutputFormat::Pretty),
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Expand an event file into its slots
    Expand(ExpandArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `eventslot expand`.
#[derive(Debug, Args)]
pub struct ExpandArgs {
    /// Event definition file (TOML)
    pub event_file: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Maximum number of slots to display
    #[arg(long)]
    pub limit: Option<usize>,

    /// Show timed slots in this IANA zone instead of their own
    #[arg(long)]
    pub zone: Option<Tz>,

    /// Only slots starting on or after this date (in the display zone)
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Only slots starting on or before this date (in the display zone)
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn expand_with_options() {
        let cli = Cli::try_parse_from([
            "eventslot",
            "expand",
            "standup.toml",
            "--json",
            "--limit",
            "5",
            "--zone",
            "Europe/Paris",
            "--from",
            "2024-09-01",
            "--to",
            "2024-09-30",
            "--debug",
        ])
        .unwrap();

        assert!(cli.debug);
        let Command::Expand(args) = cli.command else {
            panic!("expected expand");
        };
        assert_eq!(args.event_file, PathBuf::from("standup.toml"));
        assert!(args.json);
        assert_eq!(args.limit, Some(5));
        assert_eq!(args.zone, Some(chrono_tz::Europe::Paris));
        assert_eq!(args.from, NaiveDate::from_ymd_opt(2024, 9, 1));
        assert_eq!(args.to, NaiveDate::from_ymd_opt(2024, 9, 30));
    }

    #[test]
    fn from_requires_to() {
        let result = Cli::try_parse_from(["eventslot", "expand", "e.toml", "--from", "2024-09-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_zone_rejected() {
        let result = Cli::try_parse_from(["eventslot", "expand", "e.toml", "--zone", "Mars/Base"]);
        assert!(result.is_err());
    }

    #[test]
    fn log_format_selects_tracing_preset() {
        let cli = Cli::try_parse_from(["eventslot", "--log-format", "json", "config", "path"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);

        let json = cli.log_format.tracing_config(false);
        assert_eq!(json.output_format, TracingOutputFormat::Json);
        assert_eq!(json.default_level, Level::WARN);
        assert_eq!(LogFormat::Json.tracing_config(true).default_level, Level::DEBUG);

        let quiet = LogFormat::default().tracing_config(false);
        assert_eq!(quiet.output_format, TracingOutputFormat::Compact);
        assert_eq!(quiet.default_level, Level::WARN);

        let pretty = LogFormat::Pretty.tracing_config(true);
        assert_eq!(pretty.output_format, TracingOutputFormat::Pretty);
        assert_eq!(pretty.default_level, Level::DEBUG);
        assert!(pretty.include_location);
    }

    #[test]
    fn config_actions() {
        let cli = Cli::try_parse_from(["eventslot", "config", "validate"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Validate
            }
        ));
    }
}
