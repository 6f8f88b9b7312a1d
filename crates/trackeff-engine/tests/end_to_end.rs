//! Integration test: three truth events, reconstructed in a different
//! order, each aligned and counted exactly once at its own coordinate.

use trackeff_core::EventIdentity;
use trackeff_engine::{AssessorConfig, EfficiencyAssessor, EventOutcome};
use trackeff_test_utils::{
    good_pair, primary, BandCentrality, ReconstructedEventBuilder, TruthEventBuilder,
    VecTruthSource,
};

struct Case {
    event: u32,
    vz: f64,
    ref_mult: u32,
    truth_pts: &'static [f64],
    matched_pts: &'static [f64],
    /// Expected (lumi, cent, vz) coordinate.
    coord: [u32; 3],
}

const CASES: [Case; 3] = [
    Case {
        event: 1,
        vz: -25.0,
        ref_mult: 10,
        truth_pts: &[0.3],
        matched_pts: &[0.3],
        coord: [1, 0, 0],
    },
    Case {
        event: 2,
        vz: 0.0,
        ref_mult: 120,
        truth_pts: &[1.2, 2.6],
        matched_pts: &[1.2],
        coord: [1, 2, 2],
    },
    Case {
        event: 3,
        vz: 20.0,
        ref_mult: 460,
        truth_pts: &[0.7, 1.7, 4.9],
        matched_pts: &[],
        coord: [1, 8, 4],
    },
];

const RUN: u32 = 15_107_008;

fn truth_stream() -> VecTruthSource {
    let events = CASES
        .iter()
        .map(|c| {
            let mut b = TruthEventBuilder::new(RUN, c.event).vertex_z(c.vz);
            for &pt in c.truth_pts {
                b = b.particle(primary(pt, 0.2, 0.5));
            }
            for &pt in c.matched_pts {
                b = b.matched(good_pair(pt, 0.2, 0.5));
            }
            b.build()
        })
        .collect();
    VecTruthSource::new(events)
}

fn assessor() -> EfficiencyAssessor<VecTruthSource> {
    let config = AssessorConfig {
        centrality: Some(Box::new(BandCentrality::default())),
        ..AssessorConfig::default()
    };
    let mut a = EfficiencyAssessor::new(truth_stream(), config);
    a.initialize().unwrap();
    a
}

#[test]
fn shuffled_streams_align_and_count_once() {
    let mut a = assessor();
    for &i in &[2usize, 0, 1] {
        let c = &CASES[i];
        let reco = ReconstructedEventBuilder::new(RUN, c.event)
            .vertex(0.1, -0.1, c.vz)
            .ref_mult(c.ref_mult)
            .build();
        let outcome = a.process(&reco).unwrap();
        let EventOutcome::Accepted(summary) = outcome else {
            panic!("event {} not accepted: {outcome:?}", c.event);
        };
        assert_eq!(summary.truth_index, i);
        assert_eq!(summary.coord.as_slice(), &c.coord);
        assert_eq!(summary.truth as usize, c.truth_pts.len());
        assert_eq!(summary.matched as usize, c.matched_pts.len());
    }

    let out = a.finalize().unwrap();
    assert_eq!(
        out.identities,
        vec![
            EventIdentity::new(RUN, 3),
            EventIdentity::new(RUN, 1),
            EventIdentity::new(RUN, 2),
        ]
    );

    let counts = out.counts.family_id("counts").unwrap();
    let mut total = 0;
    for c in &CASES {
        let cell = out.counts.cell(counts, &c.coord).unwrap();
        assert_eq!(cell.entries(), 1, "event {} counted {} times", c.event, cell.entries());
        let bin = [c.truth_pts.len() as u32, c.matched_pts.len() as u32];
        assert_eq!(cell.bin_content(&bin), 1.0);
        total += cell.entries();
    }
    let occupied: usize = out.counts.families().map(|(_, f)| f.occupied_count()).sum();
    assert_eq!(occupied, 3);
    assert_eq!(total, 3);
}

#[test]
fn truth_family_is_keyed_by_momentum() {
    let mut a = assessor();
    let c = &CASES[1];
    let reco = ReconstructedEventBuilder::new(RUN, c.event)
        .vertex(0.0, 0.0, c.vz)
        .ref_mult(c.ref_mult)
        .build();
    a.process(&reco).unwrap();
    let out = a.finalize().unwrap();

    // pT 1.2 → bin 4 and pT 2.6 → bin 10 of 20 over (0, 5].
    for pt_bin in [4, 10] {
        let coord = [c.coord[0], c.coord[1], c.coord[2], pt_bin];
        let cell = out.grid.cell(out.families.truth, &coord).unwrap();
        assert_eq!(cell.entries(), 1);
    }
    let matched = out.grid.cell(out.families.matched.dca, &[1, 2, 2, 4]).unwrap();
    assert_eq!(matched.entries(), 1);
    assert!(out.grid.cell(out.families.matched.dca, &[1, 2, 2, 10]).is_none());

    assert_eq!(out.qa.truth_pt.entries(), 2);
    assert_eq!(out.qa.matched_pt.entries(), 1);
}
