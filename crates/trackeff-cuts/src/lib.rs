//! Acceptance cuts for the trackeff efficiency engine.
//!
//! [`EventCuts`] evaluates every enabled event-level cut on every event
//! (after the run mask) so that per-cut rejection counts stay meaningful
//! even for events another cut already rejected. [`TrackCuts`] runs the
//! staged track cascade and reports the diagnostic points to an observer
//! so callers can fill pre-cut and scale histograms at the right moment.
//!
//! Rejections are counted outcomes, never errors. The only error in
//! this crate is [`CutError`], for failures while bulk-loading a run mask.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod mask;
pub mod track;

pub use error::CutError;
pub use event::{EventCut, EventCutStats, EventCuts, EventVerdict, RangeCut};
pub use mask::parse_run_mask;
pub use track::{CascadePoint, TrackClass, TrackCutConfig, TrackCutStats, TrackCuts, TrackStage, TrackVerdict};
