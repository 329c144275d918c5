//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::Selection;
use std::path::PathBuf;

use crate::error::CliError;

/// Stream Emulator - replays recorded entity event streams onto MQTT brokers
#[derive(Parser, Debug)]
#[command(
    name = "stream-emulator",
    author,
    version,
    about = "Replay recorded artifact and stakeholder event streams onto MQTT brokers",
    long_about = "Replays pre-recorded, timestamped event streams of shipment artifacts and \n\
                  stakeholders as real-time MQTT publications, so a process-monitoring \n\
                  system can be tested without real hardware or business partners.\n\n\
                  Without a subcommand the arguments are those of `run`.",
    args_conflicts_with_subcommands = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "STREAM_EMULATOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "STREAM_EMULATOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// `run` arguments given without the subcommand
    #[command(flatten)]
    pub run: Option<RunArgs>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay the configured streams
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the resolved topology
    Info(InfoArgs),
}

/// Process instance selection (mutually exclusive lists)
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Replay only these process instances (comma-separated)
    #[arg(
        long = "instance",
        value_delimiter = ',',
        conflicts_with = "process_types"
    )]
    pub instances: Vec<String>,

    /// Replay every instance of these process types (comma-separated)
    #[arg(long = "process-type", value_delimiter = ',')]
    pub process_types: Vec<String>,
}

impl SelectionArgs {
    pub fn selection(&self) -> Result<Selection, CliError> {
        Selection::from_lists(&self.instances, &self.process_types)
            .ok_or(CliError::ConflictingSelection)
    }
}

/// Arguments for the `run` command
///
/// No environment fallbacks here: an explicit value would mark the bare
/// `run` form as present alongside another subcommand.
#[derive(Parser, Debug, Clone)]
#[group(args = ["config"])]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    pub config: PathBuf,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Replay speed multiplier, overrides `replay.speed` (min 0.1)
    #[arg(long)]
    pub speed: Option<f64>,

    /// Directory relative stream paths are resolved against, overrides `replay.base_dir`
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Stop after this many seconds even if events remain (0 = no timeout)
    #[arg(long, default_value = "0")]
    pub timeout: u64,

    /// Resolve topology and load streams, then exit without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    pub config: PathBuf,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Load stream files and show event counts per entity
    #[arg(long)]
    pub events: bool,

    /// Directory relative stream paths are resolved against
    #[arg(long, env = "STREAM_EMULATOR_BASE_DIR")]
    pub base_dir: Option<PathBuf>,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("stream-emulator").chain(args.iter().copied()))
    }

    #[test]
    fn test_run_requires_config() {
        let err = parse(&["run"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_instance_and_process_type_conflict() {
        let err = parse(&["run", "c.toml", "--instance", "I1", "--process-type", "AMS-CDG"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_instance_list_split_on_comma() {
        let cli = parse(&["run", "c.toml", "--instance", "I1,I2"]).unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(
            args.selection.selection().unwrap(),
            Selection::Instances(vec!["I1".into(), "I2".into()])
        );
        assert_eq!(args.timeout, 0);
        assert_eq!(args.metrics_port, 0);
    }

    #[test]
    fn test_no_filter_selects_all() {
        let cli = parse(&["info", "c.toml", "--events"]).unwrap();
        let Some(Commands::Info(args)) = cli.command else {
            panic!("expected info");
        };
        assert!(args.events);
        assert_eq!(args.selection.selection().unwrap(), Selection::All);
    }

    #[test]
    fn test_global_flags() {
        let cli = parse(&["validate", "c.toml", "-vv", "--log-format", "json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
    }

    #[test]
    fn test_bare_config_runs_replay() {
        let cli = parse(&["c.toml", "--instance", "I1"]).unwrap();
        assert!(cli.command.is_none());
        let args = cli.run.expect("bare arguments parse as run");
        assert_eq!(args.config, PathBuf::from("c.toml"));
        assert_eq!(
            args.selection.selection().unwrap(),
            Selection::Instances(vec!["I1".into()])
        );
        assert!(!args.dry_run);
    }

    #[test]
    fn test_subcommand_leaves_bare_run_empty() {
        let cli = parse(&["validate", "c.toml"]).unwrap();
        assert!(cli.run.is_none());
        assert!(matches!(cli.command, Some(Commands::Validate(_))));
    }

    #[test]
    fn test_no_arguments_prints_help() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }
}
