//! Command handler modules for the CLI.

mod config;
mod run;
mod session;
mod shell;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;

/// Global logging flags
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbosity<'a> {
    /// Number of `-v` flags
    pub verbose: u8,
    /// `-q` was given
    pub quiet: bool,
    /// `--log-file`
    pub log_file: Option<&'a Path>,
}

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(
    config_path: Option<&Path>,
    verbosity: Verbosity<'_>,
    command: Commands,
) -> Result<(), CliError> {
    match command {
        Commands::Shell { target } => shell::cmd_shell(config_path, verbosity, &target),
        Commands::Run {
            target,
            commands,
            trailing,
            format,
            fail_fast,
        } => run::cmd_run(
            config_path,
            verbosity,
            &run::RunParams {
                target: &target,
                commands: commands.into_iter().chain(trailing).collect(),
                format,
                fail_fast,
            },
        ),
        Commands::Config(subcommand) => config::cmd_config(config_path, subcommand),
    }
}
