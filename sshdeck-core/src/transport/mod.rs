//! SSH transport boundary
//!
//! The controller never talks to the network directly. It drives an
//! [`SshTransport`] that knows how to connect, run one command to completion,
//! and tear a session down.
//!
//! - [`OpenSshTransport`] - system `ssh` client sharing one ControlMaster
//!   connection per session
//! - [`ScriptedTransport`] - in-memory transport with queued replies, for
//!   tests and demos

mod openssh;
mod scripted;
pub mod shell;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportResult;
use crate::models::{ConnectionConfig, SessionId};

pub use openssh::{OpenSshOptions, OpenSshTransport};
pub use scripted::{ExecRelease, ScriptedTransport, TransportCall};

/// Reply of [`SshTransport::connect`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResponse {
    /// Whether the connection was established and authenticated
    pub success: bool,
    /// Human-readable outcome, shown to the user
    pub message: String,
    /// Identifier of the new session; present only on success
    pub session_id: Option<SessionId>,
    /// Initial remote working directory, when the transport reads it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_directory: Option<String>,
}

impl ConnectResponse {
    /// Successful connect
    #[must_use]
    pub fn connected(session_id: SessionId, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            session_id: Some(session_id),
            current_directory: None,
        }
    }

    /// Connect refused (unreachable host, bad credentials, ...)
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            session_id: None,
            current_directory: None,
        }
    }

    /// Sets the initial working directory
    #[must_use]
    pub fn with_current_directory(mut self, directory: Option<String>) -> Self {
        self.current_directory = directory;
        self
    }
}

/// Captured output of a command that ran to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Remote exit status
    pub exit_status: i32,
    /// Whether the exit status is 0
    pub success: bool,
    /// Working directory after the command, when tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_directory: Option<String>,
}

impl ExecOutput {
    /// Creates an output record; `success` follows the exit status
    #[must_use]
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_status: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_status,
            success: exit_status == 0,
            current_directory: None,
        }
    }

    /// Sets the working directory after the command
    #[must_use]
    pub fn with_current_directory(mut self, directory: Option<String>) -> Self {
        self.current_directory = directory;
        self
    }
}

/// External SSH collaborator used by
/// [`SessionController`](crate::session::SessionController)
///
/// Implementations must distinguish "the command ran and exited non-zero"
/// (`Ok` with that exit status) from "the request could not be carried out"
/// (`Err`).
#[async_trait]
pub trait SshTransport: Send + Sync {
    /// Establishes and authenticates a connection
    ///
    /// An unsuccessful but orderly attempt (bad password, host unreachable)
    /// is reported as `Ok` with `success == false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt itself could not be made.
    async fn connect(&self, config: &ConnectionConfig) -> TransportResult<ConnectResponse>;

    /// Runs one command to completion on an existing session
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be run (connection lost,
    /// unknown session, helper process failure).
    async fn execute(&self, session_id: &SessionId, command: &str) -> TransportResult<ExecOutput>;

    /// Tears a session down; best effort
    ///
    /// # Errors
    ///
    /// Returns an error if the teardown could not be confirmed.
    async fn disconnect(&self, session_id: &SessionId) -> TransportResult<()>;
}
