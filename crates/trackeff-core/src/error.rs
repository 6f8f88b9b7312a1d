//! Error types for the trackeff efficiency engine.
//!
//! Organized by failure class: configuration (fatal, the run does not
//! start), alignment (per-event data-integrity failure), and lifecycle
//! (an operation attempted in the wrong phase). [`ProcessError`] is the
//! union surfaced by per-event processing.
//!
//! Cut rejections and out-of-range bin lookups are *not* errors; they
//! are counted outcomes.

use std::error::Error;
use std::fmt;

use crate::id::EventIdentity;
use crate::phase::Phase;

/// Errors detected while validating configuration.
///
/// Raised at initialization; fatal to the run.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// An axis has a non-positive bin count or a non-positive width.
    InvalidAxis {
        /// Axis name (e.g. `"vz"`).
        name: &'static str,
        /// Configured bin count.
        bins: u32,
        /// Configured lower edge.
        low: f64,
        /// Configured upper edge.
        high: f64,
    },
    /// No centrality provider was configured.
    NoCentralityProvider,
    /// A library-version tag does not select any known centrality model.
    UnknownLibrary {
        /// The rejected tag.
        tag: String,
    },
    /// A centrality model was given an unusable calibration.
    InvalidCentrality {
        /// Description of the problem.
        reason: String,
    },
    /// A cut threshold is not a usable number.
    InvalidCut {
        /// Description of the problem.
        reason: String,
    },
    /// A histogram or histogram family cannot be built as requested.
    InvalidHistogram {
        /// Description of the problem.
        reason: String,
    },
    /// The product of grid axis bin counts overflows `usize`.
    GridTooLarge,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAxis {
                name,
                bins,
                low,
                high,
            } => write!(
                f,
                "axis '{name}' is invalid: {bins} bins over ({low}, {high}]"
            ),
            Self::NoCentralityProvider => write!(f, "no centrality provider configured"),
            Self::UnknownLibrary { tag } => {
                write!(f, "library tag '{tag}' selects no centrality model")
            }
            Self::InvalidCentrality { reason } => {
                write!(f, "invalid centrality calibration: {reason}")
            }
            Self::InvalidCut { reason } => write!(f, "invalid cut: {reason}"),
            Self::InvalidHistogram { reason } => write!(f, "invalid histogram: {reason}"),
            Self::GridTooLarge => write!(f, "histogram grid cell count overflows usize"),
        }
    }
}

impl Error for ConfigError {}

/// The truth stream could not be aligned with a reconstructed event.
///
/// Indicates the two streams are out of correspondence. Non-fatal: the
/// event is skipped, but the condition is reported distinctly from a
/// cut rejection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlignmentError {
    /// The truth stream holds no entries at all.
    EmptyTruthStream {
        /// Identity that was being searched for.
        identity: EventIdentity,
    },
    /// A full wraparound of the truth stream found no matching identity.
    NoMatch {
        /// Identity that was being searched for.
        identity: EventIdentity,
        /// Number of entries inspected before giving up.
        attempts: usize,
    },
}

impl AlignmentError {
    /// The identity that failed to align.
    pub fn identity(&self) -> EventIdentity {
        match self {
            Self::EmptyTruthStream { identity } | Self::NoMatch { identity, .. } => *identity,
        }
    }
}

impl fmt::Display for AlignmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTruthStream { identity } => {
                write!(f, "cannot align {identity}: truth stream is empty")
            }
            Self::NoMatch { identity, attempts } => write!(
                f,
                "no truth event matches {identity} after {attempts} attempts"
            ),
        }
    }
}

impl Error for AlignmentError {}

/// An operation was attempted in a phase that does not permit it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifecycleError {
    /// The operation that was refused (e.g. `"process"`).
    pub operation: &'static str,
    /// The phase the assessor was in.
    pub phase: Phase,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not allowed while {}", self.operation, self.phase)
    }
}

impl Error for LifecycleError {}

/// Failure to move an assessor from `Uninitialized` to `Initialized`.
#[derive(Clone, Debug, PartialEq)]
pub enum InitError {
    /// The configuration is invalid.
    Config(ConfigError),
    /// The assessor was already initialized or finalized.
    Lifecycle(LifecycleError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration rejected: {e}"),
            Self::Lifecycle(e) => write!(f, "lifecycle violation: {e}"),
        }
    }
}

impl Error for InitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Lifecycle(e) => Some(e),
        }
    }
}

impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<LifecycleError> for InitError {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

/// Per-event processing failure.
///
/// Cut rejections are not represented here; they are part of the
/// successful outcome of processing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessError {
    /// The event could not be aligned with the truth stream.
    Alignment(AlignmentError),
    /// The assessor is not in a phase that accepts events.
    Lifecycle(LifecycleError),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alignment(e) => write!(f, "alignment failed: {e}"),
            Self::Lifecycle(e) => write!(f, "lifecycle violation: {e}"),
        }
    }
}

impl Error for ProcessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Alignment(e) => Some(e),
            Self::Lifecycle(e) => Some(e),
        }
    }
}

impl From<AlignmentError> for ProcessError {
    fn from(e: AlignmentError) -> Self {
        Self::Alignment(e)
    }
}

impl From<LifecycleError> for ProcessError {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_error_chains_source() {
        let inner = AlignmentError::NoMatch {
            identity: EventIdentity::new(1, 2),
            attempts: 3,
        };
        let outer = ProcessError::from(inner.clone());
        let src = outer.source().map(|s| s.to_string());
        assert_eq!(src, Some(inner.to_string()));
    }

    #[test]
    fn alignment_error_reports_identity() {
        let e = AlignmentError::EmptyTruthStream {
            identity: EventIdentity::new(5, 6),
        };
        assert_eq!(e.identity(), EventIdentity::new(5, 6));
    }

    #[test]
    fn lifecycle_error_display() {
        let e = LifecycleError {
            operation: "process",
            phase: Phase::Finalized,
        };
        assert_eq!(e.to_string(), "'process' is not allowed while finalized");
    }

    #[test]
    fn init_error_wraps_config() {
        let e = InitError::from(ConfigError::NoCentralityProvider);
        assert_eq!(e.to_string(), "configuration rejected: no centrality provider configured");
        assert!(e.source().is_some());
    }
}
