//! Lifecycle phases of an efficiency assessment run.

use std::fmt;

/// The phase an assessor is in.
///
/// Transitions are strictly forward:
/// `Uninitialized` → `Initialized` → `Finalized`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Axes may still be changed; no accumulation is possible.
    Uninitialized,
    /// Axes are frozen and the grid is allocated; events may be processed.
    Initialized,
    /// Output has been handed off; nothing more may be accumulated.
    Finalized,
}

impl Phase {
    /// Whether events may be processed in this phase.
    pub fn accepts_events(self) -> bool {
        matches!(self, Self::Initialized)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initialized => write!(f, "initialized"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}
