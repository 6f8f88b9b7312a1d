//! Histogram storage for the trackeff efficiency engine.
//!
//! - [`Histogram`]: a dense 1–3 dimensional weighted histogram with
//!   sum-of-weights-squared bookkeeping, binned with [`AxisDef`]
//!   semantics.
//! - [`HistogramGrid`]: named families of histogram cells laid over an
//!   [`AxisGrid`], one flat sparse slot per linear grid index, allocated
//!   on first fill.
//!
//! [`AxisDef`]: trackeff_axis::AxisDef
//! [`AxisGrid`]: trackeff_axis::AxisGrid

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod grid;
pub mod histogram;

pub use grid::{FamilyId, HistogramFamily, HistogramGrid};
pub use histogram::Histogram;
