//! Integration test: finalize a synthetic run into a store and read it back.

use std::io::Cursor;

use trackeff_engine::{AssessorConfig, AssessorOutput, AxisSet, EfficiencyAssessor};
use trackeff_store::{StoreError, StoreReader, StoreWriter, FORMAT_VERSION};
use trackeff_test_utils::{synthetic_run, BandCentrality, SyntheticRunConfig, VecTruthSource};

fn finalized(seed: u64) -> (AssessorOutput, Vec<u8>) {
    let run = synthetic_run(
        seed,
        &SyntheticRunConfig {
            events: 60,
            shuffle: true,
            ..SyntheticRunConfig::default()
        },
    );
    let config = AssessorConfig {
        centrality: Some(Box::new(BandCentrality::default())),
        ..AssessorConfig::default()
    };
    let mut a = EfficiencyAssessor::new(VecTruthSource::new(run.truth), config);
    a.initialize().unwrap();
    for reco in &run.reco {
        a.process(reco).unwrap();
    }
    let mut writer = StoreWriter::new(Vec::new());
    let output = a.finalize_into(&mut writer).unwrap();
    assert_eq!(writer.runs_written(), 1);
    (output, writer.into_inner())
}

#[test]
fn stored_run_matches_finalized_output() {
    let (output, bytes) = finalized(11);
    let reader = StoreReader::open(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.header().centrality, "band");
    assert_eq!(reader.header().crate_version, env!("CARGO_PKG_VERSION"));

    let stored = reader.read_run().unwrap();
    assert_eq!(stored.identities, output.identities);
    assert_eq!(stored.metrics, output.metrics);
    assert_eq!(stored.grid, output.grid);
    assert_eq!(stored.counts, output.counts);

    let named = output.qa.named();
    assert_eq!(stored.histograms.len(), named.len());
    for (name, h) in named {
        assert_eq!(stored.histogram(&name), Some(h), "histogram {name}");
    }
    assert_eq!(
        stored.grid.family_id("matched_dca"),
        Some(output.families.matched.dca)
    );
    stored.verify_config(&output.axes).unwrap();
}

#[test]
fn different_binning_is_a_config_mismatch() {
    let (_, bytes) = finalized(5);
    let stored = StoreReader::open(Cursor::new(bytes)).unwrap().read_run().unwrap();
    let mut axes = AxisSet::default();
    axes.momentum = trackeff_axis::AxisDef::new(20, 0.0, 5.0);
    match stored.verify_config(&axes) {
        Err(StoreError::ConfigMismatch { recorded, current }) => assert_ne!(recorded, current),
        other => panic!("expected ConfigMismatch, got {other:?}"),
    }
}

#[test]
fn wrong_magic_is_rejected() {
    let (_, mut bytes) = finalized(1);
    bytes[0] = b'X';
    match StoreReader::open(Cursor::new(bytes)) {
        Err(StoreError::BadMagic) => {}
        Err(other) => panic!("expected BadMagic, got {other:?}"),
        Ok(_) => panic!("expected BadMagic, got a reader"),
    }
}

#[test]
fn future_version_is_rejected() {
    let (_, mut bytes) = finalized(1);
    bytes[4] = FORMAT_VERSION + 1;
    match StoreReader::open(Cursor::new(bytes)) {
        Err(StoreError::UnsupportedVersion { found }) => assert_eq!(found, FORMAT_VERSION + 1),
        Err(other) => panic!("expected UnsupportedVersion, got {other:?}"),
        Ok(_) => panic!("expected UnsupportedVersion, got a reader"),
    }
}

#[test]
fn truncated_body_fails_to_decode() {
    let (_, mut bytes) = finalized(2);
    let cut = bytes.len() / 2;
    bytes.truncate(cut);
    let reader = StoreReader::open(Cursor::new(bytes)).unwrap();
    assert!(reader.read_run().is_err());
}
