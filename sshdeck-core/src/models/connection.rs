//! Connection parameters for a single connect attempt

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Authentication method selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Password authentication
    #[default]
    Password,
    /// Identity file (private key) authentication
    Key,
}

impl AuthMethod {
    /// Returns the method tag as used in requests and settings
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Key => "key",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "password" => Ok(Self::Password),
            "key" | "publickey" => Ok(Self::Key),
            other => Err(SessionError::InvalidConfig(format!(
                "unknown authentication method '{other}' (expected 'password' or 'key')"
            ))),
        }
    }
}

/// Authentication payload: exactly one of password or identity file
///
/// Secrets are wrapped in [`SecretString`] so they are zeroized on drop and
/// redacted from `Debug` output.
#[derive(Debug)]
pub enum AuthPayload {
    /// Password authentication
    Password {
        /// Account password
        password: SecretString,
    },
    /// Private key authentication
    Identity {
        /// Path to the private key file
        identity_path: PathBuf,
        /// Optional key passphrase
        passphrase: Option<SecretString>,
    },
}

impl AuthPayload {
    /// Returns the method this payload belongs to
    #[must_use]
    pub const fn method(&self) -> AuthMethod {
        match self {
            Self::Password { .. } => AuthMethod::Password,
            Self::Identity { .. } => AuthMethod::Key,
        }
    }

    /// Returns the identity file path for key authentication
    #[must_use]
    pub fn identity_path(&self) -> Option<&Path> {
        match self {
            Self::Identity { identity_path, .. } => Some(identity_path),
            Self::Password { .. } => None,
        }
    }
}

/// Validated parameters for one connect attempt
///
/// Host and username are guaranteed non-empty. The value is consumed by
/// [`crate::session::SessionController::connect`] and dropped once the
/// attempt resolves, which zeroizes the secrets it carries.
#[derive(Debug)]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    username: String,
    auth: AuthPayload,
}

impl ConnectionConfig {
    /// Creates a connection config
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] if host or username is empty
    /// after trimming, or if `port` is 0.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        auth: AuthPayload,
    ) -> SessionResult<Self> {
        let host = host.into().trim().to_string();
        let username = username.into().trim().to_string();

        if host.is_empty() {
            return Err(SessionError::InvalidConfig("host is required".to_string()));
        }
        if username.is_empty() {
            return Err(SessionError::InvalidConfig(
                "username is required".to_string(),
            ));
        }
        if port == 0 {
            return Err(SessionError::InvalidConfig(
                "port must be between 1 and 65535".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            username,
            auth,
        })
    }

    /// Remote host name or address
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Remote SSH port
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Login name
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Authentication payload
    #[must_use]
    pub const fn auth(&self) -> &AuthPayload {
        &self.auth
    }

    /// `user@host:port`, used in greetings and logs
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }
}
