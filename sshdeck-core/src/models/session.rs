//! Identity and metadata of a live session

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::connection::{AuthMethod, ConnectionConfig};

/// Opaque session identifier issued by the transport
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an identifier returned by a transport
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Display metadata of a session; never holds secrets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Remote host
    pub host: String,
    /// Remote port
    pub port: u16,
    /// Login name
    pub username: String,
    /// Authentication method that was used
    pub auth_method: AuthMethod,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
}

impl SessionInfo {
    /// Captures the non-secret parts of a connection config
    #[must_use]
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            host: config.host().to_string(),
            port: config.port(),
            username: config.username().to_string(),
            auth_method: config.auth().method(),
            connected_at: Utc::now(),
        }
    }

    /// `user@host:port`
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }
}

/// A live, authenticated session: identifier plus metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    id: SessionId,
    info: SessionInfo,
}

impl SessionHandle {
    /// Creates a handle for a session the transport just opened
    #[must_use]
    pub const fn new(id: SessionId, info: SessionInfo) -> Self {
        Self { id, info }
    }

    /// Session identifier
    #[must_use]
    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    /// Session metadata
    #[must_use]
    pub const fn info(&self) -> &SessionInfo {
        &self.info
    }
}
