//! Binning axes and grid shapes for the trackeff efficiency engine.
//!
//! An [`AxisDef`] maps a value to a bin index under the open-low,
//! closed-high convention. A [`GridShape`] flattens a tuple of bin
//! indices into a single linear index using mixed-radix strides, and an
//! [`AxisGrid`] ties named axes to a shape so a tuple of values can be
//! located in one call.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod axis;
pub mod grid;

pub use axis::AxisDef;
pub use grid::{AxisGrid, GridAxis, GridShape};
