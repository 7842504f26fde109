//! Handle lifecycle state machine

use std::fmt;

use crate::error::{KvError, Result};

/// Lifecycle state of a connection handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created, parameters not yet checked
    Unmounted,

    /// Parameters checked, no transport open
    Validated,

    /// Transport open, ready for queries
    Connected,

    /// Transport closed
    Closed,
}

impl LifecycleState {
    /// Check if transition is valid
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::*;

        matches!(
            (self, next),
            (Unmounted, Validated)
                | (Validated, Connected)
                | (Closed, Connected)
                | (_, Closed)
        )
    }

    /// Transition to new state
    pub fn transition(&mut self, next: LifecycleState) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(match next {
                LifecycleState::Connected => KvError::NotValidated,
                _ => KvError::connection_failed(format!(
                    "invalid transition from {} to {}",
                    self, next
                )),
            });
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmounted => write!(f, "unmounted"),
            Self::Validated => write!(f, "validated"),
            Self::Connected => write!(f, "connected"),
            Self::Closed => write!(f, "closed"),
        }
    }
}
