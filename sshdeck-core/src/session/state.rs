//! Lifecycle states of the session controller

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of the single session owned by a controller
///
/// ```text
/// Disconnected -> Connecting -> Connected -> Disconnecting -> Disconnected
///                      |                                          ^
///                      +-------------- (connect failed) ----------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No session; initial and terminal state
    #[default]
    Disconnected,
    /// A connect attempt is in progress
    Connecting,
    /// A session is registered and accepts commands
    Connected,
    /// Teardown is in progress
    Disconnecting,
}

impl LifecycleState {
    /// Returns the lowercase state name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        }
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connected | Self::Disconnected)
                | (Self::Connected, Self::Disconnecting | Self::Disconnected)
                | (Self::Disconnecting, Self::Disconnected)
        )
    }

    /// Returns true if commands are accepted
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
