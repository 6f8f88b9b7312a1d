//! The trackeff efficiency engine.
//!
//! Per reconstructed event, [`EfficiencyAssessor::process`] aligns the
//! truth stream, applies event cuts, classifies centrality, locates the
//! event in the configured grid, runs the staged track cascade over
//! matched pairs and data tracks, and accumulates everything that
//! survives into the histogram grid and the diagnostic histograms.
//!
//! # Lifecycle
//!
//! `Uninitialized` (axes and cuts may change) → `Initialized` (grid
//! allocated, events accepted) → `Finalized` (output handed off). There
//! is no way back.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod align;
pub mod assessor;
pub mod centrality;
pub mod config;
pub mod metrics;
pub mod output;
pub mod qa;

pub use align::EventAligner;
pub use assessor::{EfficiencyAssessor, EventOutcome, EventSummary, FinalizeError, RejectReason};
pub use centrality::{CentralityCalibration, CentralityModel, GRefMultCorrection, LibraryTag};
pub use config::{AssessorConfig, AxisSet, GridAxes};
pub use metrics::RunMetrics;
pub use output::{AssessorOutput, GridFamilies, HistogramSink, QualityFamilies};
pub use qa::{EventQa, QaHistograms, QualitySet, TrackQa};
