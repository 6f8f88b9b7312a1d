//! Store writer.

use std::io::Write;

use trackeff_engine::{AssessorOutput, HistogramSink};

use crate::codec;
use crate::error::StoreError;
use crate::hash::config_hash;
use crate::types::StoreHeader;

/// Writes finalized output to a binary store stream.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
/// use std::io::BufWriter;
/// use trackeff_store::StoreWriter;
///
/// let file = BufWriter::new(File::create("efficiency.teff").unwrap());
/// let mut writer = StoreWriter::new(file);
/// // assessor.finalize_into(&mut writer)?;
/// writer.flush().unwrap();
/// ```
pub struct StoreWriter<W: Write> {
    writer: W,
    runs_written: u64,
}

impl<W: Write> StoreWriter<W> {
    /// Wrap a byte sink.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            runs_written: 0,
        }
    }

    /// Encode one finalized run and flush.
    pub fn write(&mut self, output: &AssessorOutput) -> Result<(), StoreError> {
        let header = StoreHeader {
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            config_hash: config_hash(&output.axes),
            centrality: output.centrality.clone(),
        };
        let w: &mut dyn Write = &mut self.writer;
        codec::encode_header(w, &header)?;
        codec::encode_identities(w, &output.identities)?;
        codec::encode_metrics(w, &output.metrics)?;
        codec::encode_named(w, &output.qa.named())?;
        codec::encode_grid(w, &output.grid)?;
        codec::encode_grid(w, &output.counts)?;
        self.writer.flush()?;
        self.runs_written += 1;
        tracing::info!(
            identities = output.identities.len(),
            config_hash = header.config_hash,
            "wrote efficiency store"
        );
        Ok(())
    }

    /// Number of runs written so far.
    pub fn runs_written(&self) -> u64 {
        self.runs_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> HistogramSink for StoreWriter<W> {
    type Error = StoreError;

    fn write_output(&mut self, output: &AssessorOutput) -> Result<(), StoreError> {
        self.write(output)
    }
}
