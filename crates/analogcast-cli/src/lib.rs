// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod commands;
mod helpers;

use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

use analogcast_core::{ErrorCode, ExitCode, MachineError};
use analogcast_engine::EngineError;
use analogcast_forecast::ForecastError;
use analogcast_model::{EntityId, Month, ValidationError};
use analogcast_policies::PolicyValidationError;
use analogcast_store::StoreError;
use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Generator, Shell};

const ANALOGCAST_HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
Usage: {usage}

Options:
{options}

Commands:
{subcommands}
{after-help}";

#[derive(Parser)]
#[command(name = "analogcast", version)]
#[command(about = "Analog (nearest-neighbour DTW) forecasting of monthly series")]
#[command(help_template = ANALOGCAST_HELP_TEMPLATE)]
#[command(
    after_help = "Environment:\n  ANALOGCAST_LOG_LEVEL   Log filter override (falls back to RUST_LOG)\n  ANALOGCAST_LOG_JSON    Emit JSON log lines when set to 1\n  ANALOGCAST_CONFIG      Forecast config file used when --config is absent"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long, global = true, default_value_t = false)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast every entity at one period and publish the artifacts.
    Forecast {
        #[arg(long)]
        history: PathBuf,
        #[arg(long)]
        entities: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        output_root: PathBuf,
        /// Forecast origin (YYYY-MM); defaults to the last observed month.
        #[arg(long)]
        period: Option<Month>,
        /// Fixed RFC3339 UTC `generatedAt` stamp.
        #[arg(long, conflicts_with = "deterministic_time")]
        generated_at: Option<String>,
        /// Stamp artifacts with the epoch so reruns are byte-identical.
        #[arg(long, default_value_t = false)]
        deterministic_time: bool,
        #[arg(long)]
        max_threads: Option<usize>,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// DTW distance between two comma-separated sequences.
    Dtw {
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        a: Vec<f64>,
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        b: Vec<f64>,
        /// Sakoe-Chiba radius.
        #[arg(long)]
        band: Option<usize>,
        /// Also print the optimal warping path.
        #[arg(long, default_value_t = false)]
        path: bool,
    },
    /// Nearest analogs of one entity's window ending at `--end`.
    Matches {
        #[arg(long)]
        history: PathBuf,
        #[arg(long)]
        entity: EntityId,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        end: Option<Month>,
    },
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommand,
    },
    /// Latest published period under an output root.
    Latest {
        #[arg(long)]
        output_root: PathBuf,
    },
    /// Effective forecast configuration and where it came from.
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum SnapshotCommand {
    /// Parse and strictly validate a snapshot document.
    Validate { path: PathBuf },
}

#[derive(Clone, Copy)]
struct LogFlags {
    quiet: bool,
    verbose: u8,
    trace: bool,
    json: bool,
}

#[derive(Clone, Copy)]
pub(crate) struct OutputMode {
    json: bool,
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => {
                return Err(CliError {
                    exit_code: ExitCode::Usage,
                    machine: MachineError::from_code(
                        ErrorCode::UsageError,
                        "invalid command line arguments",
                    )
                    .with_detail("error", &err.to_string()),
                });
            }
        },
    };
    let output_mode = OutputMode { json: cli.json };
    let command = cli.command.ok_or_else(|| {
        CliError::from_code(ErrorCode::UsageError, "missing command; see --help".to_string())
    })?;
    helpers::init_tracing(LogFlags {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
    });

    match command {
        Commands::Forecast {
            history,
            entities,
            config,
            output_root,
            period,
            generated_at,
            deterministic_time,
            max_threads,
            overwrite,
        } => commands::run_forecast_command(
            commands::ForecastCliArgs {
                history,
                entities,
                config,
                output_root,
                period,
                generated_at,
                deterministic_time,
                max_threads,
                overwrite,
            },
            output_mode,
        ),
        Commands::Dtw { a, b, band, path } => {
            commands::run_dtw(&a, &b, band, path, output_mode)
        }
        Commands::Matches {
            history,
            entity,
            config,
            end,
        } => commands::run_matches(history, &entity, config, end, output_mode),
        Commands::Snapshot { command } => match command {
            SnapshotCommand::Validate { path } => commands::validate_snapshot(path, output_mode),
        },
        Commands::Latest { output_root } => commands::run_latest(output_root, output_mode),
        Commands::Config { config } => commands::run_config(config, output_mode),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    }
}

fn print_completion<G: Generator>(generator: G) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    generate(generator, &mut command, name, &mut std::io::stdout());
}

#[derive(Debug)]
pub(crate) struct CliError {
    exit_code: ExitCode,
    machine: MachineError,
}

impl CliError {
    pub(crate) fn from_code(code: ErrorCode, message: String) -> Self {
        Self {
            exit_code: code.exit_code(),
            machine: MachineError::from_code(code, message),
        }
    }

    pub(crate) fn internal(message: String) -> Self {
        Self::from_code(ErrorCode::Internal, message)
    }
}

impl From<ForecastError> for CliError {
    fn from(err: ForecastError) -> Self {
        Self::from_code(err.code, err.message)
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        Self::from_code(err.code(), err.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::from_code(err.code.as_error_code(), err.message)
    }
}

impl From<PolicyValidationError> for CliError {
    fn from(err: PolicyValidationError) -> Self {
        Self::from_code(ErrorCode::InvalidConfig, err.0)
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        Self::from_code(ErrorCode::InvalidInput, err.0)
    }
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match serde_json::to_string(&error.machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal_error\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("{}", error.machine);
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, CliError};
    use analogcast_core::{ErrorCode, ExitCode};
    use analogcast_forecast::ForecastError;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn forecast_errors_keep_their_machine_code() {
        let err: CliError = ForecastError::new(ErrorCode::Conflict, "exists").into();
        assert_eq!(err.exit_code, ExitCode::DependencyFailure);
        assert_eq!(err.machine.code, "conflict");
        let err: CliError = ForecastError::new(ErrorCode::MissingMonth, "gap").into();
        assert_eq!(err.exit_code, ExitCode::Validation);
    }
}
