//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sshdeck_core::AuthMethod;

/// `sshdeck` command-line interface for interactive SSH sessions
#[derive(Parser)]
#[command(name = "sshdeck")]
#[command(author, version, about = "Interactive SSH sessions with a command transcript")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true, env = "SSHDECK_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log errors only and skip the connection greeting
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write log lines to this file instead of standard error
    #[arg(long, global = true, env = "SSHDECK_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Open a session and read commands from standard input
    #[command(about = "Connect and run commands typed line by line")]
    Shell {
        #[command(flatten)]
        target: ConnectArgs,
    },

    /// Open a session, run the given commands in order, and disconnect
    #[command(about = "Connect, run commands in order, print the transcript")]
    Run {
        #[command(flatten)]
        target: ConnectArgs,

        /// Command to run; may be repeated
        #[arg(short = 'e', long = "command", value_name = "COMMAND")]
        commands: Vec<String>,

        /// Commands given after `--`, one per argument, run after the
        /// `--command` ones
        #[arg(last = true, value_name = "COMMANDS")]
        trailing: Vec<String>,

        /// Transcript output format
        #[arg(short, long, default_value = "text", value_enum)]
        format: OutputFormat,

        /// Stop at the first failed command and exit with an error
        #[arg(long)]
        fail_fast: bool,
    },

    /// Inspect or create the settings file
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Connection target and credentials shared by session commands
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Host name or address
    #[arg(short = 'H', long)]
    pub host: String,

    /// Port; falls back to the configured default when missing or invalid
    #[arg(short, long)]
    pub port: Option<String>,

    /// Login name
    #[arg(short, long)]
    pub user: String,

    /// Authentication method
    #[arg(short, long, default_value = "password", value_enum)]
    pub auth: AuthArg,

    /// Private key for key authentication
    #[arg(short, long, value_name = "PATH")]
    pub identity: Option<String>,

    /// Prompt for the key passphrase (unless `SSHDECK_PASSPHRASE` is set)
    #[arg(long)]
    pub ask_passphrase: bool,
}

/// Authentication method argument
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AuthArg {
    /// Password, read from `SSHDECK_PASSWORD` or prompted
    Password,
    /// Private key file given with `--identity`
    Key,
}

impl From<AuthArg> for AuthMethod {
    fn from(arg: AuthArg) -> Self {
        match arg {
            AuthArg::Password => Self::Password,
            AuthArg::Key => Self::Key,
        }
    }
}

/// Output format for the run command
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable transcript
    Text,
    /// Transcript as JSON
    Json,
}

/// Settings file subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings as TOML
    Show,
    /// Print the settings file path
    Path,
    /// Write a settings file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
