//! Registry of the live session handle

use crate::error::{SessionError, SessionResult};
use crate::models::{SessionHandle, SessionId};

/// Holds at most one live [`SessionHandle`]
///
/// Owned by the controller; the presentation layer reads it through the
/// controller instead of sharing ambient state.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    current: Option<SessionHandle>,
}

impl SessionRegistry {
    /// Creates an empty registry
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Registers a freshly connected session
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyConnected`] if a handle is already
    /// registered; the existing handle is kept.
    pub fn register(&mut self, handle: SessionHandle) -> SessionResult<()> {
        if self.current.is_some() {
            return Err(SessionError::AlreadyConnected);
        }
        self.current = Some(handle);
        Ok(())
    }

    /// Removes the registered handle, if any. Idempotent.
    pub fn clear(&mut self) -> Option<SessionHandle> {
        self.current.take()
    }

    /// Returns the registered handle
    #[must_use]
    pub const fn current(&self) -> Option<&SessionHandle> {
        self.current.as_ref()
    }

    /// Returns true if `id` is the registered session
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.current.as_ref().is_some_and(|handle| handle.id() == id)
    }

    /// Returns all live handles (zero or one)
    #[must_use]
    pub fn list(&self) -> Vec<SessionHandle> {
        self.current.iter().cloned().collect()
    }

    /// Returns true if no session is registered
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}
