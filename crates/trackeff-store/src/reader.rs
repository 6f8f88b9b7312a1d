//! Store reader.

use std::io::Read;

use crate::codec;
use crate::error::StoreError;
use crate::types::{StoreHeader, StoredRun};

/// Reads finalized output from a binary store stream.
pub struct StoreReader<R: Read> {
    reader: R,
    header: StoreHeader,
}

impl<R: Read> StoreReader<R> {
    /// Open a store stream, validating magic and version.
    pub fn open(mut reader: R) -> Result<Self, StoreError> {
        let header = codec::decode_header(&mut reader)?;
        Ok(Self { reader, header })
    }

    /// The header read by [`open`](Self::open).
    pub fn header(&self) -> &StoreHeader {
        &self.header
    }

    /// Decode the rest of the stream into a [`StoredRun`].
    pub fn read_run(mut self) -> Result<StoredRun, StoreError> {
        let r: &mut dyn Read = &mut self.reader;
        let identities = codec::decode_identities(r)?;
        let metrics = codec::decode_metrics(r)?;
        let histograms = codec::decode_named(r)?;
        let grid = codec::decode_grid(r)?;
        let counts = codec::decode_grid(r)?;
        tracing::debug!(
            identities = identities.len(),
            histograms = histograms.len(),
            "read efficiency store"
        );
        Ok(StoredRun {
            header: self.header,
            identities,
            metrics,
            histograms,
            grid,
            counts,
        })
    }
}
