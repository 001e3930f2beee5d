//! At-most-one-in-flight guard for command execution

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{SessionError, SessionResult};

/// Non-blocking gate that admits one command at a time
///
/// Overlapping requests are rejected instead of queued, so the caller learns
/// immediately that it broke the serial-submission contract.
#[derive(Debug, Default)]
pub struct ExecutionGate {
    busy: AtomicBool,
}

impl ExecutionGate {
    /// Creates an open gate
    #[must_use]
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Claims the gate
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ExecutionInProgress`] if a permit is live.
    pub fn try_acquire(&self) -> SessionResult<ExecutionPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ExecutionPermit { gate: self })
            .map_err(|_| SessionError::ExecutionInProgress)
    }

    /// Returns true while a permit is live
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of exclusive execution; reopens the gate when dropped
///
/// Dropping also happens when the owning future is dropped mid-await, so an
/// abandoned request never leaves the session wedged.
#[derive(Debug)]
pub struct ExecutionPermit<'a> {
    gate: &'a ExecutionGate,
}

impl Drop for ExecutionPermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}
