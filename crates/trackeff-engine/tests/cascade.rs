//! Integration test: staged fills of the track cascade.
//!
//! One pair is built to fail each stage. Pre-cut histograms see every
//! pair, the scale histogram sees only pairs past fit points, fit
//! fraction, and |η|, and post-cut histograms see only the survivor.

use trackeff_core::{DataTrack, MatchedPair};
use trackeff_engine::{AssessorConfig, AssessorOutput, EfficiencyAssessor, EventOutcome};
use trackeff_test_utils::{
    good_pair, good_track, FixedCentrality, ReconstructedEventBuilder, TruthEventBuilder,
    VecTruthSource,
};

fn staged_pairs() -> Vec<MatchedPair> {
    let mut few_hits = good_pair(1.0, 0.1, 0.1);
    few_hits.fit_points = 10;
    few_hits.possible_points = 12;

    let mut low_fraction = good_pair(1.0, 0.1, 0.1);
    low_fraction.fit_points = 25;
    low_fraction.possible_points = 100;

    let forward = good_pair(1.0, 1.5, 0.1);

    let mut far = good_pair(1.0, 0.1, 0.1);
    far.dca_global = 3.4;
    far.dca_transverse = 1.0;

    vec![few_hits, low_fraction, forward, far, good_pair(1.0, 0.1, 0.1)]
}

fn run(pairs: Vec<MatchedPair>, tracks: Vec<DataTrack>) -> (EventOutcome, AssessorOutput) {
    let mut truth = TruthEventBuilder::new(3, 3);
    for p in pairs {
        truth = truth.matched(p);
    }
    let mut reco = ReconstructedEventBuilder::new(3, 3);
    for t in tracks {
        reco = reco.track(t);
    }
    let config = AssessorConfig {
        centrality: Some(Box::new(FixedCentrality(Some(1)))),
        ..AssessorConfig::default()
    };
    let mut a = EfficiencyAssessor::new(VecTruthSource::new(vec![truth.build()]), config);
    a.initialize().unwrap();
    let outcome = a.process(&reco.build()).unwrap();
    (outcome, a.finalize().unwrap())
}

#[test]
fn each_stage_fills_its_own_histograms() {
    let (outcome, out) = run(staged_pairs(), Vec::new());
    let EventOutcome::Accepted(summary) = outcome else {
        panic!("expected acceptance, got {outcome:?}");
    };
    assert_eq!(summary.matched, 1);

    let qa = &out.qa.matched;
    assert_eq!(qa.pre.fit_points.entries(), 5);
    // The DCA-failing pair reaches the scale stage; its DCA is beyond the
    // scale axis, so it is recorded as a miss.
    assert_eq!(qa.dca_scale.entries() + qa.dca_scale.misses(), 2);
    assert_eq!(qa.dca_scale.entries(), 1);
    assert_eq!(qa.post.fit_points.entries(), 1);
    assert_eq!(qa.weighted_dca.entries(), 1);

    let s = &out.matched_cuts;
    assert_eq!(s.visited, 5);
    assert_eq!(s.failed_fit_points, 1);
    assert_eq!(s.failed_fit_fraction, 1);
    assert_eq!(s.failed_eta, 1);
    assert_eq!(s.failed_dca, 1);
    assert_eq!(s.accepted, 1);
}

#[test]
fn weighted_dca_uses_inverse_jacobian() {
    let (_, out) = run(vec![good_pair(1.0, 0.1, 0.1)], Vec::new());
    let expected = 1.0 / (1.5 * 1.5 * (0.5f64 / 1.5).asin());
    assert!((out.qa.matched.weighted_dca.integral() - expected).abs() < 1e-12);
    // Grid cells are unweighted by default.
    let cell_sum: f64 = out
        .grid
        .family(out.families.matched.dca)
        .unwrap()
        .occupied()
        .map(|(_, h)| h.integral())
        .sum();
    assert_eq!(cell_sum, 1.0);
}

#[test]
fn data_tracks_share_the_cascade_and_split_on_pid() {
    let mut bad = good_track(1.0, 0.0, 0.0);
    bad.flag = -5;
    let mut off_pid = good_track(1.0, 0.0, 0.0);
    off_pid.pid_sigma = -2.0;
    let mut short = good_track(1.0, 0.0, 0.0);
    short.fit_points = 5;
    let tracks = vec![bad, off_pid, short, good_track(2.0, 0.0, 0.0)];

    let (outcome, out) = run(Vec::new(), tracks);
    let EventOutcome::Accepted(summary) = outcome else {
        panic!("expected acceptance, got {outcome:?}");
    };
    assert_eq!(summary.data, 2);
    // |pid_sigma| == window is outside.
    assert_eq!(summary.data_pid, 1);

    assert_eq!(out.data_cuts.bad_flag, 1);
    assert_eq!(out.data_cuts.visited, 3);
    assert_eq!(out.qa.data.pre.fit_points.entries(), 3);
    assert_eq!(out.qa.data.weighted_dca.entries(), 2);
    assert_eq!(out.qa.data_pid_weighted_dca.entries(), 1);

    let occupied = |id| out.grid.family(id).map_or(0, |f| f.occupied_count());
    assert_eq!(occupied(out.families.data.dca), 2);
    assert_eq!(occupied(out.families.data_pid.dca), 1);
    assert_eq!(out.metrics.accepted_data_pid, 1);
}
