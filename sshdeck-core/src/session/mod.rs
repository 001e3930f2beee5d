//! Session lifecycle and command execution
//!
//! [`SessionController`] is the entry point. The other types are its
//! building blocks and are exported for display layers and tests.

mod controller;
mod gate;
mod registry;
mod state;
mod transcript;

pub use controller::{ControllerOptions, SessionController};
pub use gate::{ExecutionGate, ExecutionPermit};
pub use registry::SessionRegistry;
pub use state::LifecycleState;
pub use transcript::{EntryKind, Transcript, TranscriptEntry};
