//! The event model: truth events from the embedding simulation and
//! reconstructed events from the data stream.
//!
//! Events are transient values; the engine borrows one per call and
//! never retains it beyond its identity.

use crate::id::{EventIdentity, GeantId, TriggerId};
use crate::traits::TrackQuality;

/// A simulated particle with known kinematics.
#[derive(Clone, Debug, PartialEq)]
pub struct TruthParticle {
    /// Particle type.
    pub geant_id: GeantId,
    /// Parent particle type; [`GeantId::NONE`] for embedded primaries.
    pub parent_geant_id: GeantId,
    /// Generated transverse momentum (GeV/c).
    pub pt: f64,
    /// Generated pseudorapidity.
    pub eta: f64,
    /// Generated azimuth (radians).
    pub phi: f64,
}

impl TruthParticle {
    /// Whether this particle was injected directly (has no parent).
    pub fn is_primary(&self) -> bool {
        self.parent_geant_id == GeantId::NONE
    }
}

/// A truth particle associated with exactly one reconstructed track.
///
/// Kinematics are those of the reconstructed track; the GEANT ids are
/// those of the truth particle.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchedPair {
    /// Particle type of the truth partner.
    pub geant_id: GeantId,
    /// Parent type of the truth partner.
    pub parent_geant_id: GeantId,
    /// Reconstructed transverse momentum (GeV/c).
    pub pt: f64,
    /// Reconstructed pseudorapidity.
    pub eta: f64,
    /// Reconstructed azimuth (radians).
    pub phi: f64,
    /// 3-D distance of closest approach to the primary vertex (cm).
    pub dca_global: f64,
    /// Transverse (xy) distance of closest approach (cm).
    pub dca_transverse: f64,
    /// Hits used in the track fit.
    pub fit_points: u32,
    /// Hits geometrically available to the track.
    pub possible_points: u32,
}

impl MatchedPair {
    /// Whether the truth partner is a primary particle.
    pub fn is_primary(&self) -> bool {
        self.parent_geant_id == GeantId::NONE
    }
}

/// One entry of the truth stream.
#[derive(Clone, Debug, PartialEq)]
pub struct TruthEvent {
    /// Join key against the reconstructed stream.
    pub identity: EventIdentity,
    /// Simulated vertex z position (cm).
    pub vertex_z: f64,
    /// Number of truth tracks in the event, primaries and secondaries.
    pub mc_track_count: u32,
    /// Truth particles.
    pub particles: Vec<TruthParticle>,
    /// Truth particles matched to a reconstructed track.
    pub matched: Vec<MatchedPair>,
}

/// Primary vertex position (cm).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VertexPosition {
    /// x coordinate.
    pub x: f64,
    /// y coordinate.
    pub y: f64,
    /// z coordinate (along the beam).
    pub z: f64,
}

impl VertexPosition {
    /// Transverse distance of the vertex from the beam line.
    pub fn radial(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// A track reconstructed from real data.
#[derive(Clone, Debug, PartialEq)]
pub struct DataTrack {
    /// Reconstruction quality flag; negative means the fit is unusable.
    pub flag: i32,
    /// Transverse momentum (GeV/c).
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth (radians).
    pub phi: f64,
    /// 3-D distance of closest approach (cm).
    pub dca_global: f64,
    /// Transverse distance of closest approach (cm).
    pub dca_transverse: f64,
    /// Hits used in the track fit.
    pub fit_points: u32,
    /// Hits geometrically available to the track.
    pub possible_points: u32,
    /// Particle-identification significance (nσ) for the selected species.
    pub pid_sigma: f64,
}

/// The event currently delivered by the host framework.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructedEvent {
    /// Join key against the truth stream.
    pub identity: EventIdentity,
    /// Primary vertex.
    pub vertex: VertexPosition,
    /// Standard reference multiplicity.
    pub ref_mult: u32,
    /// Global-track reference multiplicity.
    pub gref_mult: u32,
    /// Beam-monitor (luminosity) coincidence rate (Hz).
    pub beam_rate: f64,
    /// Triggers fired for this event.
    pub trigger_ids: Vec<TriggerId>,
    /// Primary tracks.
    pub tracks: Vec<DataTrack>,
}

/// Inverse Jacobian of the 2-D impact-parameter to DCA-magnitude
/// projection: `|1 / (g² · asin(t / g))|`.
///
/// Returns `None` when the weight is not finite (zero DCA, or a
/// transverse DCA exceeding the global one).
pub fn inverse_jacobian(dca_global: f64, dca_transverse: f64) -> Option<f64> {
    let w = (1.0 / (dca_global * dca_global * (dca_transverse / dca_global).asin())).abs();
    w.is_finite().then_some(w)
}

impl TrackQuality for MatchedPair {
    fn pt(&self) -> f64 {
        self.pt
    }
    fn eta(&self) -> f64 {
        self.eta
    }
    fn phi(&self) -> f64 {
        self.phi
    }
    fn dca_global(&self) -> f64 {
        self.dca_global
    }
    fn dca_transverse(&self) -> f64 {
        self.dca_transverse
    }
    fn fit_points(&self) -> u32 {
        self.fit_points
    }
    fn possible_points(&self) -> u32 {
        self.possible_points
    }
}

impl TrackQuality for DataTrack {
    fn pt(&self) -> f64 {
        self.pt
    }
    fn eta(&self) -> f64 {
        self.eta
    }
    fn phi(&self) -> f64 {
        self.phi
    }
    fn dca_global(&self) -> f64 {
        self.dca_global
    }
    fn dca_transverse(&self) -> f64 {
        self.dca_transverse
    }
    fn fit_points(&self) -> u32 {
        self.fit_points
    }
    fn possible_points(&self) -> u32 {
        self.possible_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn track(fit: u32, poss: u32) -> DataTrack {
        DataTrack {
            flag: 1,
            pt: 1.0,
            eta: 0.0,
            phi: 0.0,
            dca_global: 1.0,
            dca_transverse: 0.5,
            fit_points: fit,
            possible_points: poss,
            pid_sigma: 0.0,
        }
    }

    #[test]
    fn weight_matches_closed_form() {
        let expected = 1.0 / (1.5f64.powi(2) * (0.5f64 / 1.5).asin());
        let w = inverse_jacobian(1.5, 0.5).unwrap();
        assert!((w - expected).abs() < 1e-12, "{w} vs {expected}");
    }

    #[test]
    fn weight_is_absolute() {
        let w = inverse_jacobian(1.5, -0.5).unwrap();
        assert!(w > 0.0);
        assert!((w - inverse_jacobian(1.5, 0.5).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn weight_rejects_degenerate_dca() {
        assert_eq!(inverse_jacobian(0.0, 0.0), None);
        assert_eq!(inverse_jacobian(1.0, 0.0), None);
        assert_eq!(inverse_jacobian(1.0, 2.0), None);
    }

    #[test]
    fn fit_fraction_plain_ratio() {
        assert!((track(26, 52).fit_fraction() - 0.5).abs() < 1e-12);
        assert_eq!(track(10, 0).fit_fraction(), 0.0);
    }

    #[test]
    fn radial_vertex() {
        let v = VertexPosition {
            x: 3.0,
            y: 4.0,
            z: 10.0,
        };
        assert!((v.radial() - 5.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn weight_positive_inside_domain(g in 0.01f64..3.0, frac in 0.01f64..1.0) {
            let w = inverse_jacobian(g, g * frac);
            prop_assert!(w.is_some());
            prop_assert!(w.unwrap() > 0.0);
        }
    }
}
