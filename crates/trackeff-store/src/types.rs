//! Decoded store records.

use indexmap::IndexMap;
use trackeff_core::EventIdentity;
use trackeff_engine::{AxisSet, RunMetrics};
use trackeff_hist::{Histogram, HistogramGrid};

use crate::error::StoreError;
use crate::hash::config_hash;

/// Metadata written at the start of every store file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreHeader {
    /// Version of the crate that wrote the file.
    pub crate_version: String,
    /// [`config_hash`] of the axes the output was binned with.
    pub config_hash: u64,
    /// Name of the centrality provider used during the run.
    pub centrality: String,
}

/// A complete finalized run, as read back from a store file.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredRun {
    /// File header.
    pub header: StoreHeader,
    /// Identities of accepted events, in acceptance order.
    pub identities: Vec<EventIdentity>,
    /// Run counters.
    pub metrics: RunMetrics,
    /// QA histograms by persisted name.
    pub histograms: IndexMap<String, Histogram>,
    /// Per-cell track histogram grid.
    pub grid: HistogramGrid,
    /// Per-cell multiplicity counts.
    pub counts: HistogramGrid,
}

impl StoredRun {
    /// Look up a QA histogram by its persisted name.
    pub fn histogram(&self, name: &str) -> Option<&Histogram> {
        self.histograms.get(name)
    }

    /// Check that this run was binned with `axes`.
    pub fn verify_config(&self, axes: &AxisSet) -> Result<(), StoreError> {
        let current = config_hash(axes);
        if self.header.config_hash != current {
            return Err(StoreError::ConfigMismatch {
                recorded: self.header.config_hash,
                current,
            });
        }
        Ok(())
    }
}
