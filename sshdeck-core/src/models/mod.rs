//! Core data structures shared by the controller and the transport

mod command;
mod connection;
mod session;

pub use command::{CommandResult, ResultOrigin, TRANSPORT_FAILURE_EXIT_STATUS};
pub use connection::{AuthMethod, AuthPayload, ConnectionConfig, DEFAULT_SSH_PORT};
pub use session::{SessionHandle, SessionId, SessionInfo};
