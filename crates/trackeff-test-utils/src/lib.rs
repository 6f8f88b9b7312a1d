//! Test utilities and mock collaborators for trackeff development.
//!
//! Provides an in-memory [`TruthSource`] ([`VecTruthSource`]), simple
//! [`CentralityProvider`] stand-ins, event builders, and a seeded
//! synthetic run generator in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use trackeff_core::{
    CentralityInput, CentralityProvider, DataTrack, EventIdentity, GeantId, MatchedPair,
    ReconstructedEvent, TriggerId, TruthEvent, TruthParticle, TruthSource, VertexPosition,
};

pub use fixtures::{synthetic_run, SyntheticRun, SyntheticRunConfig};

// ── Truth source ─────────────────────────────────────────────────

/// Truth stream backed by a `Vec`, counting every load.
#[derive(Clone, Debug, Default)]
pub struct VecTruthSource {
    events: Vec<TruthEvent>,
    loads: usize,
}

impl VecTruthSource {
    pub fn new(events: Vec<TruthEvent>) -> Self {
        Self { events, loads: 0 }
    }

    /// Number of `get` calls made so far.
    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn reset_loads(&mut self) {
        self.loads = 0;
    }
}

impl TruthSource for VecTruthSource {
    fn len(&self) -> usize {
        self.events.len()
    }

    fn get(&mut self, index: usize) -> Option<&TruthEvent> {
        self.loads += 1;
        self.events.get(index)
    }
}

// ── Centrality stand-ins ─────────────────────────────────────────

/// Always returns the same class (or none).
#[derive(Clone, Copy, Debug)]
pub struct FixedCentrality(pub Option<u32>);

impl CentralityProvider for FixedCentrality {
    fn name(&self) -> &str {
        "fixed"
    }

    fn class_count(&self) -> u32 {
        9
    }

    fn classify(&self, _input: &CentralityInput) -> Option<u32> {
        self.0
    }
}

/// Class = `ref_mult / width`, capped at `classes - 1`.
#[derive(Clone, Copy, Debug)]
pub struct BandCentrality {
    pub width: u32,
    pub classes: u32,
}

impl Default for BandCentrality {
    fn default() -> Self {
        Self {
            width: 50,
            classes: 9,
        }
    }
}

impl CentralityProvider for BandCentrality {
    fn name(&self) -> &str {
        "band"
    }

    fn class_count(&self) -> u32 {
        self.classes
    }

    fn classify(&self, input: &CentralityInput) -> Option<u32> {
        if self.width == 0 || self.classes == 0 {
            return None;
        }
        Some((input.ref_mult / self.width).min(self.classes - 1))
    }
}

// ── Track helpers ────────────────────────────────────────────────

/// A primary truth particle (pi+).
pub fn primary(pt: f64, eta: f64, phi: f64) -> TruthParticle {
    TruthParticle {
        geant_id: GeantId(8),
        parent_geant_id: GeantId::NONE,
        pt,
        eta,
        phi,
    }
}

/// A matched pair that passes the default track cuts.
pub fn good_pair(pt: f64, eta: f64, phi: f64) -> MatchedPair {
    MatchedPair {
        geant_id: GeantId(8),
        parent_geant_id: GeantId::NONE,
        pt,
        eta,
        phi,
        dca_global: 1.5,
        dca_transverse: 0.5,
        fit_points: 35,
        possible_points: 45,
    }
}

/// A data track that passes the default track cuts and the PID window.
pub fn good_track(pt: f64, eta: f64, phi: f64) -> DataTrack {
    DataTrack {
        flag: 301,
        pt,
        eta,
        phi,
        dca_global: 1.5,
        dca_transverse: 0.5,
        fit_points: 35,
        possible_points: 45,
        pid_sigma: 0.3,
    }
}

// ── Event builders ───────────────────────────────────────────────

pub struct TruthEventBuilder {
    event: TruthEvent,
}

impl TruthEventBuilder {
    pub fn new(run: u32, event: u32) -> Self {
        Self {
            event: TruthEvent {
                identity: EventIdentity::new(run, event),
                vertex_z: 0.0,
                mc_track_count: 0,
                particles: Vec::new(),
                matched: Vec::new(),
            },
        }
    }

    pub fn vertex_z(mut self, z: f64) -> Self {
        self.event.vertex_z = z;
        self
    }

    pub fn particle(mut self, p: TruthParticle) -> Self {
        self.event.particles.push(p);
        self.event.mc_track_count += 1;
        self
    }

    pub fn matched(mut self, m: MatchedPair) -> Self {
        self.event.matched.push(m);
        self
    }

    pub fn build(self) -> TruthEvent {
        self.event
    }
}

pub struct ReconstructedEventBuilder {
    event: ReconstructedEvent,
}

impl ReconstructedEventBuilder {
    pub fn new(run: u32, event: u32) -> Self {
        Self {
            event: ReconstructedEvent {
                identity: EventIdentity::new(run, event),
                vertex: VertexPosition::default(),
                ref_mult: 0,
                gref_mult: 0,
                beam_rate: 5.0e4,
                trigger_ids: Vec::new(),
                tracks: Vec::new(),
            },
        }
    }

    pub fn vertex(mut self, x: f64, y: f64, z: f64) -> Self {
        self.event.vertex = VertexPosition { x, y, z };
        self
    }

    pub fn ref_mult(mut self, m: u32) -> Self {
        self.event.ref_mult = m;
        self.event.gref_mult = m;
        self
    }

    pub fn gref_mult(mut self, m: u32) -> Self {
        self.event.gref_mult = m;
        self
    }

    pub fn beam_rate(mut self, r: f64) -> Self {
        self.event.beam_rate = r;
        self
    }

    pub fn trigger(mut self, t: u32) -> Self {
        self.event.trigger_ids.push(TriggerId(t));
        self
    }

    pub fn track(mut self, t: DataTrack) -> Self {
        self.event.tracks.push(t);
        self
    }

    pub fn build(self) -> ReconstructedEvent {
        self.event
    }
}
