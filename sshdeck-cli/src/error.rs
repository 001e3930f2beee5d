//! CLI error types and exit codes.

use sshdeck_core::{ConfigError, SessionError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, input, or a failed command
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - the session could not be established or was lost
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid or unreadable user input
    #[error("Invalid input: {0}")]
    Input(String),

    /// Connection could not be established or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// Session misuse reported by the controller
    #[error("Session error: {0}")]
    Session(String),

    /// A remote command failed under `--fail-fast`
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// Output serialization error
    #[error("Output error: {0}")]
    Output(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidConfig(_) => Self::Input(err.to_string()),
            SessionError::ConnectFailure(_) | SessionError::SessionLost(_) => {
                Self::Connection(err.to_string())
            }
            _ => Self::Session(err.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, input, failed command, IO)
    /// - 2: Connection failure (connect failed, session lost)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Connection(_) => exit_codes::CONNECTION_FAILURE,
            Self::Config(_)
            | Self::Input(_)
            | Self::Session(_)
            | Self::CommandFailed(_)
            | Self::Output(_)
            | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
