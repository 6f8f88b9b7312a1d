//! Seeded synthetic runs: a truth stream plus a reconstructed stream
//! that skips and reorders entries.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

use trackeff_core::{
    DataTrack, EventIdentity, GeantId, MatchedPair, ReconstructedEvent, TriggerId, TruthEvent,
    TruthParticle, VertexPosition,
};

#[derive(Clone, Debug)]
pub struct SyntheticRunConfig {
    pub run: u32,
    pub events: usize,
    /// Probability that a truth entry has no reconstructed counterpart.
    pub skip_probability: f64,
    /// Shuffle the reconstructed stream instead of keeping truth order.
    pub shuffle: bool,
    pub max_particles: u32,
    pub max_data_tracks: u32,
    pub trigger: u32,
}

impl Default for SyntheticRunConfig {
    fn default() -> Self {
        Self {
            run: 19_130_001,
            events: 100,
            skip_probability: 0.1,
            shuffle: false,
            max_particles: 8,
            max_data_tracks: 20,
            trigger: 450_050,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SyntheticRun {
    pub truth: Vec<TruthEvent>,
    pub reco: Vec<ReconstructedEvent>,
}

fn uniform(rng: &mut ChaCha8Rng, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * rng.random::<f64>()
}

fn truth_particle(rng: &mut ChaCha8Rng) -> TruthParticle {
    let secondary = rng.random_bool(0.2);
    TruthParticle {
        geant_id: GeantId(if rng.random_bool(0.5) { 8 } else { 9 }),
        parent_geant_id: if secondary { GeantId(11) } else { GeantId::NONE },
        pt: uniform(rng, 0.1, 5.0),
        eta: uniform(rng, -1.2, 1.2),
        phi: uniform(rng, -PI, PI),
    }
}

fn matched_from(rng: &mut ChaCha8Rng, p: &TruthParticle) -> MatchedPair {
    let dca_global = uniform(rng, 0.05, 3.5);
    let fit_points = rng.random_range(10..46);
    MatchedPair {
        geant_id: p.geant_id,
        parent_geant_id: p.parent_geant_id,
        pt: (p.pt * uniform(rng, 0.97, 1.03)).min(5.0),
        eta: p.eta + uniform(rng, -0.01, 0.01),
        phi: p.phi,
        dca_global,
        dca_transverse: dca_global * uniform(rng, 0.1, 0.99),
        fit_points,
        possible_points: fit_points + rng.random_range(0..11),
    }
}

fn data_track(rng: &mut ChaCha8Rng) -> DataTrack {
    let dca_global = uniform(rng, 0.05, 3.5);
    let fit_points = rng.random_range(10..46);
    DataTrack {
        flag: if rng.random_bool(0.05) { -1 } else { 301 },
        pt: uniform(rng, 0.1, 5.0),
        eta: uniform(rng, -1.2, 1.2),
        phi: uniform(rng, -PI, PI),
        dca_global,
        dca_transverse: dca_global * uniform(rng, 0.1, 0.99),
        fit_points,
        possible_points: fit_points + rng.random_range(0..11),
        pid_sigma: uniform(rng, -4.0, 4.0),
    }
}

/// Generate a deterministic run from `seed`.
///
/// Every reconstructed event has exactly one truth counterpart; some
/// truth entries have none.
pub fn synthetic_run(seed: u64, cfg: &SyntheticRunConfig) -> SyntheticRun {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut truth = Vec::with_capacity(cfg.events);
    let mut reco = Vec::with_capacity(cfg.events);

    for i in 0..cfg.events {
        let identity = EventIdentity::new(cfg.run, i as u32 + 1);
        let vertex = VertexPosition {
            x: uniform(&mut rng, -0.5, 0.5),
            y: uniform(&mut rng, -0.5, 0.5),
            z: uniform(&mut rng, -35.0, 35.0),
        };

        let n_particles = rng.random_range(0..=cfg.max_particles);
        let particles: Vec<TruthParticle> =
            (0..n_particles).map(|_| truth_particle(&mut rng)).collect();
        let mut matched = Vec::new();
        for p in &particles {
            if rng.random_bool(0.8) {
                matched.push(matched_from(&mut rng, p));
            }
        }

        truth.push(TruthEvent {
            identity,
            vertex_z: vertex.z,
            mc_track_count: n_particles + rng.random_range(0..5),
            particles,
            matched,
        });

        if rng.random_bool(cfg.skip_probability) {
            continue;
        }

        let ref_mult = rng.random_range(0..500);
        let n_tracks = rng.random_range(0..=cfg.max_data_tracks);
        reco.push(ReconstructedEvent {
            identity,
            vertex,
            ref_mult,
            gref_mult: ref_mult + ref_mult / 10,
            beam_rate: uniform(&mut rng, 0.0, 1.0e5),
            trigger_ids: vec![TriggerId(cfg.trigger)],
            tracks: (0..n_tracks).map(|_| data_track(&mut rng)).collect(),
        });
    }

    if cfg.shuffle {
        reco.shuffle(&mut rng);
    }

    SyntheticRun { truth, reco }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_run() {
        let cfg = SyntheticRunConfig::default();
        let a = synthetic_run(7, &cfg);
        let b = synthetic_run(7, &cfg);
        assert_eq!(a.truth, b.truth);
        assert_eq!(a.reco, b.reco);
    }

    #[test]
    fn every_reco_event_has_truth() {
        let cfg = SyntheticRunConfig {
            shuffle: true,
            ..SyntheticRunConfig::default()
        };
        let run = synthetic_run(11, &cfg);
        assert_eq!(run.truth.len(), cfg.events);
        for r in &run.reco {
            assert!(run.truth.iter().any(|t| t.identity == r.identity));
        }
    }
}
