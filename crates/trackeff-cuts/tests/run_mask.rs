//! Integration test: bulk-loading a run mask from disk.

use std::fs;
use std::path::PathBuf;

use trackeff_core::{EventIdentity, ReconstructedEvent, RunId, VertexPosition};
use trackeff_cuts::{CutError, EventCuts, EventVerdict};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("trackeff-{}-{name}", std::process::id()))
}

fn event(run: u32) -> ReconstructedEvent {
    ReconstructedEvent {
        identity: EventIdentity::new(run, 1),
        vertex: VertexPosition::default(),
        ref_mult: 0,
        gref_mult: 0,
        beam_rate: 0.0,
        trigger_ids: Vec::new(),
        tracks: Vec::new(),
    }
}

#[test]
fn mask_file_masks_listed_runs() {
    let path = temp_path("mask.txt");
    fs::write(
        &path,
        "# bad runs, production 2014\n15107008, 15107009\n\n# trailing\n15107010,,abc,0\n",
    )
    .unwrap();

    let mut cuts = EventCuts::new();
    let n = cuts.mask_runs_from_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(n, 3);
    let masked: Vec<RunId> = cuts.masked_runs().collect();
    assert_eq!(masked, [RunId(15_107_008), RunId(15_107_009), RunId(15_107_010)]);

    assert_eq!(cuts.accept(&event(15_107_009)), EventVerdict::Masked);
    assert_eq!(cuts.accept(&event(15_107_011)), EventVerdict::Accepted);
    assert_eq!(cuts.stats().masked, 1);
    assert_eq!(cuts.stats().events, 1);
}

#[test]
fn missing_mask_file_names_the_path() {
    let path = temp_path("does-not-exist.txt");
    let mut cuts = EventCuts::new();
    match cuts.mask_runs_from_file(&path) {
        Err(CutError::Open { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Open error, got {other:?}"),
    }
    assert_eq!(cuts.masked_runs().count(), 0);
}
