//! `sshdeck` CLI - Command-line interface for SSH sessions with a transcript
//!
//! Provides an interactive `shell`, a batch `run` command with text or JSON
//! transcript output, and `config` helpers for the settings file.

mod cli;
mod commands;
mod error;
mod format;
mod util;

use clap::Parser;
use cli::Cli;
use commands::Verbosity;

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let verbosity = Verbosity {
        verbose: cli.verbose,
        quiet: cli.quiet,
        log_file: cli.log_file.as_deref(),
    };

    let result = commands::dispatch(config_path, verbosity, cli.command);

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
