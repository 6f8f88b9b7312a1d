//! Benchmark profiles and utilities for the trackeff efficiency engine.
//!
//! Provides pre-built run profiles for benchmarking:
//!
//! - [`reference_profile`]: 1K events in truth order
//! - [`stress_profile`]: 10K events with a shuffled reconstructed stream
//! - [`reference_config`]: default binning with the raw reference
//!   multiplicity centrality model
//! - [`ready_assessor`]: an initialized assessor over a generated run

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use trackeff_core::ReconstructedEvent;
use trackeff_engine::{
    AssessorConfig, CentralityCalibration, CentralityModel, EfficiencyAssessor, LibraryTag,
};
use trackeff_test_utils::{synthetic_run, SyntheticRunConfig, VecTruthSource};

/// 1K events, reconstructed in truth order with 10% skipped.
pub fn reference_profile() -> SyntheticRunConfig {
    SyntheticRunConfig {
        events: 1_000,
        ..SyntheticRunConfig::default()
    }
}

/// 10K events, reconstructed stream shuffled.
pub fn stress_profile() -> SyntheticRunConfig {
    SyntheticRunConfig {
        events: 10_000,
        shuffle: true,
        max_data_tracks: 60,
        ..SyntheticRunConfig::default()
    }
}

/// Default axes and cuts, centrality from raw reference multiplicity
/// thresholds.
pub fn reference_config() -> AssessorConfig {
    let model = CentralityModel::for_library(LibraryTag::Sl18h, CentralityCalibration::default())
        .unwrap();
    AssessorConfig {
        centrality: Some(Box::new(model)),
        ..AssessorConfig::default()
    }
}

/// Generate a run from `profile` and return an initialized assessor over
/// its truth stream, plus the reconstructed events to feed it.
pub fn ready_assessor(
    seed: u64,
    profile: &SyntheticRunConfig,
) -> (EfficiencyAssessor<VecTruthSource>, Vec<ReconstructedEvent>) {
    let run = synthetic_run(seed, profile);
    let mut assessor = EfficiencyAssessor::new(VecTruthSource::new(run.truth), reference_config());
    assessor.initialize().unwrap();
    (assessor, run.reco)
}
