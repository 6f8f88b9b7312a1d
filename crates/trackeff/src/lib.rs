//! trackeff: tracking-efficiency assessment for embedded Monte Carlo data.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all trackeff sub-crates. For most users, adding `trackeff` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use trackeff::prelude::*;
//! use trackeff_test_utils::{
//!     good_pair, good_track, primary, BandCentrality, ReconstructedEventBuilder,
//!     TruthEventBuilder, VecTruthSource,
//! };
//!
//! let truth = vec![TruthEventBuilder::new(1, 7)
//!     .particle(primary(1.2, 0.1, 0.3))
//!     .matched(good_pair(1.1, 0.1, 0.3))
//!     .build()];
//! let config = AssessorConfig {
//!     centrality: Some(Box::new(BandCentrality::default())),
//!     ..AssessorConfig::default()
//! };
//! let mut assessor = EfficiencyAssessor::new(VecTruthSource::new(truth), config);
//! assessor.initialize().unwrap();
//!
//! let reco = ReconstructedEventBuilder::new(1, 7)
//!     .ref_mult(120)
//!     .track(good_track(1.0, 0.2, 0.3))
//!     .build();
//! let outcome = assessor.process(&reco).unwrap();
//! assert!(outcome.is_accepted());
//!
//! let output = assessor.finalize().unwrap();
//! assert_eq!(output.metrics.accepted_truth, 1);
//! assert_eq!(output.identities.len(), 1);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `trackeff-core` | IDs, event model, errors, collaborator traits |
//! | [`axis`] | `trackeff-axis` | Uniform binning axes and grid shapes |
//! | [`hist`] | `trackeff-hist` | Weighted histograms and per-cell histogram grids |
//! | [`cuts`] | `trackeff-cuts` | Event and track selections with statistics |
//! | [`engine`] | `trackeff-engine` | Event alignment, centrality, the assessor |
//! | [`store`] | `trackeff-store` | Binary persistence of finalized output |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`trackeff-core`).
///
/// Contains the truth and reconstructed event model, error types, and the
/// collaborator traits [`types::TruthSource`] and
/// [`types::CentralityProvider`].
pub use trackeff_core as types;

/// Binning axes (`trackeff-axis`).
pub use trackeff_axis as axis;

/// Histograms (`trackeff-hist`).
///
/// [`hist::Histogram`] for a single weighted histogram,
/// [`hist::HistogramGrid`] for one histogram per bin-space cell.
pub use trackeff_hist as hist;

/// Event and track selections (`trackeff-cuts`).
pub use trackeff_cuts as cuts;

/// The efficiency assessor and its collaborators (`trackeff-engine`).
///
/// [`engine::EfficiencyAssessor`] drives the
/// initialize / process / finalize lifecycle.
pub use trackeff_engine as engine;

/// Binary persistence of finalized output (`trackeff-store`).
///
/// Write with [`store::StoreWriter`], read back with
/// [`store::StoreReader`].
pub use trackeff_store as store;

/// Common imports for typical trackeff usage.
///
/// ```rust
/// use trackeff::prelude::*;
/// ```
pub mod prelude {
    // Event model and traits
    pub use trackeff_core::{
        CentralityInput, CentralityProvider, DataTrack, EventIdentity, MatchedPair, Phase,
        ReconstructedEvent, TrackQuality, TruthEvent, TruthParticle, TruthSource,
    };

    // Errors
    pub use trackeff_core::{ConfigError, InitError, LifecycleError, ProcessError};

    // Binning
    pub use trackeff_axis::AxisDef;
    pub use trackeff_hist::{Histogram, HistogramGrid};

    // Selections
    pub use trackeff_cuts::{EventCuts, TrackCutConfig};

    // Engine
    pub use trackeff_engine::{
        AssessorConfig, AssessorOutput, AxisSet, EfficiencyAssessor, EventOutcome,
        HistogramSink, RunMetrics,
    };

    // Store
    pub use trackeff_store::{StoreReader, StoreWriter};
}
