//! Normalizes raw connect requests into [`ConnectionConfig`]

use std::path::PathBuf;

use secrecy::SecretString;
use tracing::debug;
use zeroize::Zeroize;

use crate::error::{SessionError, SessionResult};
use crate::models::{AuthMethod, AuthPayload, ConnectionConfig, DEFAULT_SSH_PORT};
use crate::tracing::span_names;

/// Connect request as entered by the user
///
/// All fields are free text. Both the password and the identity fields may be
/// filled in; the selected [`AuthMethod`] decides which ones count. Secret
/// fields are zeroized when the request is dropped.
#[derive(Default)]
pub struct RawConnectionRequest {
    /// Host name or address
    pub host: String,
    /// Port as typed; unparsable values fall back to the default port
    pub port: String,
    /// Login name
    pub username: String,
    /// Password for password authentication
    pub password: String,
    /// Path to a private key for key authentication
    pub identity_path: String,
    /// Passphrase for the private key; blank means none
    pub passphrase: String,
}

impl RawConnectionRequest {
    /// Creates a request with blank secret and identity fields
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            username: username.into(),
            password: String::new(),
            identity_path: String::new(),
            passphrase: String::new(),
        }
    }
}

impl std::fmt::Debug for RawConnectionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawConnectionRequest")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("identity_path", &self.identity_path)
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

impl Drop for RawConnectionRequest {
    fn drop(&mut self) {
        self.password.zeroize();
        self.passphrase.zeroize();
    }
}

/// Pure transformation from [`RawConnectionRequest`] to [`ConnectionConfig`]
#[derive(Debug, Clone, Copy)]
pub struct CredentialResolver {
    default_port: u16,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialResolver {
    /// Creates a resolver that falls back to port 22
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default_port: DEFAULT_SSH_PORT,
        }
    }

    /// Sets the port used when the requested one does not parse
    ///
    /// A value of 0 is ignored.
    #[must_use]
    pub const fn with_default_port(mut self, port: u16) -> Self {
        if port != 0 {
            self.default_port = port;
        }
        self
    }

    /// Port used when the requested one does not parse
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        self.default_port
    }

    /// Resolves a raw request for the selected authentication method
    ///
    /// Only the fields relevant to `method` are carried into the result.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] if host or username is blank,
    /// or if key authentication is selected without an identity path. The
    /// port never causes an error.
    pub fn resolve(
        &self,
        raw: &RawConnectionRequest,
        method: AuthMethod,
    ) -> SessionResult<ConnectionConfig> {
        let _span = crate::trace_operation_debug!(span_names::CREDENTIAL_RESOLVE).entered();
        let port = self.parse_port(&raw.port);

        let auth = match method {
            AuthMethod::Password => AuthPayload::Password {
                password: SecretString::from(raw.password.as_str()),
            },
            AuthMethod::Key => {
                let path = raw.identity_path.trim();
                if path.is_empty() {
                    return Err(SessionError::InvalidConfig(
                        "identity file is required for key authentication".to_string(),
                    ));
                }
                let passphrase = if raw.passphrase.trim().is_empty() {
                    None
                } else {
                    Some(SecretString::from(raw.passphrase.as_str()))
                };
                AuthPayload::Identity {
                    identity_path: PathBuf::from(shellexpand::tilde(path).as_ref()),
                    passphrase,
                }
            }
        };

        let config = ConnectionConfig::new(raw.host.as_str(), port, raw.username.as_str(), auth)?;
        debug!(
            host = %config.host(),
            port = config.port(),
            method = %method,
            "Resolved connection request"
        );
        Ok(config)
    }

    fn parse_port(&self, raw: &str) -> u16 {
        match raw.trim().parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => self.default_port,
        }
    }
}
