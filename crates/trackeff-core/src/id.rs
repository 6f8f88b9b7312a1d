//! Strongly-typed identifiers and the [`BinCoord`] type alias.

use smallvec::SmallVec;
use std::fmt;

/// A data-taking run number.
///
/// Run numbers are assigned by the experiment and are the unit at which
/// bad data periods are masked out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(pub u32);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RunId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// An event number, unique within one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u32);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EventId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// The join key between the truth stream and the reconstructed stream.
///
/// Two events describe the same physical collision iff both the run and
/// the event number match exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventIdentity {
    /// Run the event was recorded in.
    pub run: RunId,
    /// Event number within the run.
    pub event: EventId,
}

impl EventIdentity {
    /// Build an identity from raw run and event numbers.
    pub fn new(run: u32, event: u32) -> Self {
        Self {
            run: RunId(run),
            event: EventId(event),
        }
    }
}

impl fmt::Display for EventIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run {} event {}", self.run, self.event)
    }
}

/// A GEANT particle-type code.
///
/// As a parent id, `GeantId(0)` means "no parent": the particle was
/// injected directly rather than produced in the detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeantId(pub i32);

impl GeantId {
    /// The parent id carried by primary (embedded) particles.
    pub const NONE: GeantId = GeantId(0);
}

impl fmt::Display for GeantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for GeantId {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// A trigger identifier fired for a recorded event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(pub u32);

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TriggerId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Bin coordinate: one bin index per configured grid axis.
///
/// Uses `SmallVec<[u32; 4]>` so the common grids (up to luminosity,
/// centrality, vertex-z and momentum) are stack-allocated.
pub type BinCoord = SmallVec<[u32; 4]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_requires_both_fields() {
        let a = EventIdentity::new(19_130_001, 7);
        assert_eq!(a, EventIdentity::new(19_130_001, 7));
        assert_ne!(a, EventIdentity::new(19_130_001, 8));
        assert_ne!(a, EventIdentity::new(19_130_002, 7));
    }

    #[test]
    fn identity_display() {
        assert_eq!(EventIdentity::new(12, 34).to_string(), "run 12 event 34");
    }

    #[test]
    fn primary_parent_is_zero() {
        assert_eq!(GeantId::NONE, GeantId::from(0));
    }
}
