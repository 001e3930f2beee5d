//! `sshdeck` Core Library
//!
//! This crate owns the lifecycle of one interactive SSH session: turning raw
//! connection input into a validated configuration, connecting through a
//! pluggable transport, running commands strictly one at a time, and keeping
//! an ordered transcript of every command and its result.
//!
//! # Crate Structure
//!
//! - [`credentials`] - Raw input to [`ConnectionConfig`] resolution
//! - [`session`] - [`SessionController`], lifecycle states, registry, transcript
//! - [`transport`] - [`SshTransport`] trait, OpenSSH and scripted transports
//! - [`models`] - Connection, session and command result types
//! - [`config`] - Client settings and persistence
//! - [`tracing`] - Logging setup and span names
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sshdeck_core::{AuthMethod, CredentialResolver, RawConnectionRequest, SessionController};
//! use sshdeck_core::transport::OpenSshTransport;
//!
//! let mut raw = RawConnectionRequest::new("10.0.0.5", "22", "root");
//! raw.password = "secret".to_string();
//! let config = CredentialResolver::new().resolve(&raw, AuthMethod::Password)?;
//! let controller = SessionController::new(Arc::new(OpenSshTransport::default()));
//! let handle = controller.connect(config).await?;
//! controller.execute(handle.id(), "uptime").await?;
//! controller.disconnect().await?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod session;
pub mod tracing;
pub mod transport;

pub use config::{
    ClientSettings, ConfigManager, ConnectionSettings, ExecutionSettings, LoggingSettings,
    SETTINGS_FILE_NAME,
};
pub use credentials::{CredentialResolver, RawConnectionRequest};
pub use error::{
    ConfigError, ConfigResult, SessionError, SessionResult, SshDeckError, TransportError,
    TransportResult,
};
pub use models::{
    AuthMethod, AuthPayload, CommandResult, ConnectionConfig, DEFAULT_SSH_PORT, ResultOrigin,
    SessionHandle, SessionId, SessionInfo, TRANSPORT_FAILURE_EXIT_STATUS,
};
pub use session::{
    ControllerOptions, EntryKind, LifecycleState, SessionController, Transcript, TranscriptEntry,
};
pub use crate::tracing::{
    TracingConfig, TracingError, TracingLevel, TracingOutput, TracingResult, init_tracing,
    span_names,
};
pub use transport::{ConnectResponse, ExecOutput, SshTransport};
