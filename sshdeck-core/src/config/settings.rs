//! Client settings stored in `settings.toml`

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::models::DEFAULT_SSH_PORT;
use crate::tracing::TracingLevel;

/// Root of the settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// How connections are established
    pub connection: ConnectionSettings,
    /// How commands are run
    pub execution: ExecutionSettings,
    /// Log output
    pub logging: LoggingSettings,
}

impl ClientSettings {
    /// Checks value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first invalid field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.connection.default_port == 0 {
            return Err(invalid("connection.default_port", "must be between 1 and 65535"));
        }
        if self.connection.connect_timeout_secs == 0 {
            return Err(invalid(
                "connection.connect_timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.connection.ssh_program.trim().is_empty() {
            return Err(invalid("connection.ssh_program", "must not be empty"));
        }
        if self.connection.sshpass_program.trim().is_empty() {
            return Err(invalid("connection.sshpass_program", "must not be empty"));
        }
        if !matches!(
            self.connection.strict_host_key_checking.as_str(),
            "yes" | "no" | "accept-new" | "ask" | "off"
        ) {
            return Err(invalid(
                "connection.strict_host_key_checking",
                "expected one of yes, no, accept-new, ask, off",
            ));
        }
        if self.logging.level.parse::<TracingLevel>().is_err() {
            return Err(invalid(
                "logging.level",
                "expected one of error, warn, info, debug, trace",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Port used when a request has no usable port
    pub default_port: u16,
    /// Maximum time for connect and disconnect, in seconds
    pub connect_timeout_secs: u64,
    /// `StrictHostKeyChecking` value passed to `ssh`
    pub strict_host_key_checking: String,
    /// `ssh` executable
    pub ssh_program: String,
    /// `sshpass` executable
    pub sshpass_program: String,
    /// Directory for ControlMaster sockets; defaults to a temp directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_dir: Option<PathBuf>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_SSH_PORT,
            connect_timeout_secs: 15,
            strict_host_key_checking: "accept-new".to_string(),
            ssh_program: "ssh".to_string(),
            sshpass_program: "sshpass".to_string(),
            control_dir: None,
        }
    }
}

impl ConnectionSettings {
    /// Connect timeout as a `Duration`
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Command execution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    /// Maximum run time of one command in seconds; 0 waits indefinitely
    pub command_timeout_secs: u64,
    /// Keep `cd` effective across commands
    pub track_working_directory: bool,
    /// Allocate a pseudo-terminal per command
    pub request_pty: bool,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            command_timeout_secs: 300,
            track_working_directory: true,
            request_pty: false,
        }
    }
}

impl ExecutionSettings {
    /// Command timeout, `None` when disabled
    #[must_use]
    pub const fn command_timeout(&self) -> Option<Duration> {
        if self.command_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.command_timeout_secs))
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: error, warn, info, debug, trace
    pub level: String,
    /// Custom `EnvFilter` directive, overrides `level`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            filter: None,
        }
    }
}
