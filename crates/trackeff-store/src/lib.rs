//! Persistence of finalized trackeff efficiency output.
//!
//! - [`StoreWriter`] is a [`HistogramSink`](trackeff_engine::HistogramSink)
//!   that encodes an [`AssessorOutput`](trackeff_engine::AssessorOutput)
//!   to any `Write` sink
//! - [`StoreReader`] decodes it back into a [`StoredRun`] from any `Read`
//!   source
//! - All I/O uses a small binary codec (no serde dependency)
//!
//! # Format
//!
//! ```text
//! [MAGIC "TEFF"] [VERSION u8] [StoreHeader]
//! [identity log] [run metrics] [named histograms]
//! [track grid] [count grid]
//! ```
//!
//! Grids are written sparsely: only cells that were filled at least once
//! are stored, each with its linear grid index.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod hash;
pub mod reader;
pub mod types;
pub mod writer;

pub use error::StoreError;
pub use hash::config_hash;
pub use reader::StoreReader;
pub use types::{StoreHeader, StoredRun};
pub use writer::StoreWriter;

/// Magic bytes at the start of every store file.
pub const MAGIC: [u8; 4] = *b"TEFF";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;
