//! Session state machine.
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//! Connecting   -> Disconnected            (connect failure)
//! Connected    -> Disconnected            (network loss)
//! Connecting | Connected -> ShuttingDown -> Disconnected
//! ```
//!
//! There is no way back from `ShuttingDown` to `Connected`; a new process
//! is needed to reconnect.

use std::fmt;

use crate::errors::SessionError;

/// Lifecycle state of a command session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No broker connection.
    #[default]
    Disconnected,
    /// Connect request sent, waiting for the broker's acknowledgment.
    Connecting,
    /// Subscribed and processing commands.
    Connected,
    /// Operator-requested stop in progress.
    ShuttingDown,
}

impl SessionState {
    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: Self) -> bool {
        use SessionState::{Connected, Connecting, Disconnected, ShuttingDown};
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected | Disconnected | ShuttingDown)
                | (Connected, Disconnected | ShuttingDown)
                | (ShuttingDown, Disconnected)
        )
    }

    /// Move to `next`, or fail with [`SessionError::InvalidTransition`].
    pub fn transition(&mut self, next: Self) -> Result<(), SessionError> {
        if !self.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        tracing::debug!(from = %self, to = %next, "session state change");
        *self = next;
        Ok(())
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::ShuttingDown => "shutting-down",
        })
    }
}
