//! Core types and traits for the trackeff efficiency engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the trackeff workspace:
//! event identities, the truth/reconstructed event model, error types,
//! and the narrow traits through which external collaborators (truth
//! stream, centrality estimator) are consumed.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod id;
pub mod phase;
pub mod traits;

pub use error::{AlignmentError, ConfigError, InitError, LifecycleError, ProcessError};
pub use event::{
    inverse_jacobian, DataTrack, MatchedPair, ReconstructedEvent, TruthEvent, TruthParticle,
    VertexPosition,
};
pub use id::{BinCoord, EventId, EventIdentity, GeantId, RunId, TriggerId};
pub use phase::Phase;
pub use traits::{CentralityInput, CentralityProvider, TrackQuality, TruthSource};
