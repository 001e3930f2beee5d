//! Error types for `SSHDeck`
//!
//! Each concern has its own `thiserror` enum with a matching `Result` alias.
//! [`SshDeckError`] wraps them for callers that want a single error type.

use std::time::Duration;

use thiserror::Error;

use crate::session::LifecycleState;
use crate::tracing::TracingError;

/// Top-level error type for the `SSHDeck` core library
#[derive(Debug, Error)]
pub enum SshDeckError {
    /// Session lifecycle or execution error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Transport-level failure that was not absorbed by the controller
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging initialization error
    #[error("Tracing error: {0}")]
    Tracing(#[from] TracingError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the session controller and its components
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Connection request rejected before any network attempt
    #[error("Invalid connection configuration: {0}")]
    InvalidConfig(String),

    /// The transport could not establish or authenticate the connection
    #[error("Connection failed: {0}")]
    ConnectFailure(String),

    /// Another command is still running on this session
    #[error("A command is already executing on this session")]
    ExecutionInProgress,

    /// A session is already registered
    #[error("A session is already connected; disconnect first")]
    AlreadyConnected,

    /// The operation is not allowed in the current lifecycle state
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        /// Operation that was attempted
        operation: &'static str,
        /// State the controller was in
        state: LifecycleState,
    },

    /// The session identifier does not match the registered session
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The transport no longer knows the session; local state was cleared
    #[error("Session lost: {0}")]
    SessionLost(String),

    /// Transcript append with a sequence number that does not follow the last one
    #[error("Transcript entry {got} does not follow entry {last}")]
    OutOfOrder {
        /// Sequence number of the last stored entry
        last: u64,
        /// Sequence number that was rejected
        got: u64,
    },
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Failures of the external SSH transport itself
///
/// These describe an operation that could not be carried out, as opposed to a
/// remote command that ran and exited non-zero.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// A helper program could not be started
    #[error("Failed to spawn {program}: {reason}")]
    Spawn {
        /// Program name
        program: String,
        /// OS error text
        reason: String,
    },

    /// The connection dropped or the remote side stopped responding
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// The transport has no session with this identifier
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// The operation did not finish within the configured limit
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Local I/O failure (control socket directory, pipes)
    #[error("IO error: {0}")]
    Io(String),
}

impl TransportError {
    /// Returns true when the session cannot be used any further
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::UnknownSession(_))
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors related to loading and saving settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No user configuration directory could be determined
    #[error("Could not determine the configuration directory")]
    NoConfigDir,

    /// Reading the settings file failed
    #[error("Failed to read {path}: {reason}")]
    Read {
        /// File path
        path: String,
        /// Underlying error
        reason: String,
    },

    /// Writing the settings file failed
    #[error("Failed to write {path}: {reason}")]
    Write {
        /// File path
        path: String,
        /// Underlying error
        reason: String,
    },

    /// The settings file is not valid TOML for [`crate::config::ClientSettings`]
    #[error("Failed to parse settings: {0}")]
    Parse(String),

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(String),

    /// A setting has an invalid value
    #[error("Invalid value for '{field}': {reason}")]
    Validation {
        /// Dotted field name, e.g. `connection.connect_timeout_secs`
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
