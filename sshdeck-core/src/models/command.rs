//! Outcome of one executed command

use serde::{Deserialize, Serialize};

use crate::transport::ExecOutput;

/// Exit status recorded when the transport could not run the command
///
/// Never interpreted on its own: [`CommandResult::origin`] tells a transport
/// failure apart from a remote command that exited with the same code.
pub const TRANSPORT_FAILURE_EXIT_STATUS: i32 = -1;

/// Where a [`CommandResult`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrigin {
    /// The remote command ran and reported an exit status
    Remote,
    /// The transport failed to carry out the request; output is synthesized
    Transport,
    /// Produced locally by the controller (connection greeting)
    Local,
}

/// Captured output and exit status of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Exit status reported by the remote shell
    pub exit_status: i32,
    /// Whether the status came from the remote side or was synthesized
    pub origin: ResultOrigin,
    /// Remote working directory after the command, when tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_directory: Option<String>,
}

impl CommandResult {
    /// Result of a remote command that ran to completion
    #[must_use]
    pub fn exited(stdout: impl Into<String>, stderr: impl Into<String>, exit_status: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_status,
            origin: ResultOrigin::Remote,
            current_directory: None,
        }
    }

    /// Synthesized result for a command the transport could not run
    #[must_use]
    pub fn transport_failure(diagnostic: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: diagnostic.into(),
            exit_status: TRANSPORT_FAILURE_EXIT_STATUS,
            origin: ResultOrigin::Transport,
            current_directory: None,
        }
    }

    /// Local result carrying the connection greeting
    #[must_use]
    pub fn greeting(text: impl Into<String>) -> Self {
        Self {
            stdout: text.into(),
            stderr: String::new(),
            exit_status: 0,
            origin: ResultOrigin::Local,
            current_directory: None,
        }
    }

    /// Sets the working directory reported after the command
    #[must_use]
    pub fn with_current_directory(mut self, directory: Option<String>) -> Self {
        self.current_directory = directory;
        self
    }

    /// True iff the command terminated normally with status 0
    #[must_use]
    pub fn success(&self) -> bool {
        self.origin != ResultOrigin::Transport && self.exit_status == 0
    }

    /// True if the transport failed to run the command
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        self.origin == ResultOrigin::Transport
    }
}

impl From<ExecOutput> for CommandResult {
    fn from(output: ExecOutput) -> Self {
        Self::exited(output.stdout, output.stderr, output.exit_status)
            .with_current_directory(output.current_directory)
    }
}
