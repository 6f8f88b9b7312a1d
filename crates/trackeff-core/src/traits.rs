//! Narrow interfaces to external collaborators and shared track access.

use crate::event::{inverse_jacobian, ReconstructedEvent, TruthEvent};
use crate::id::RunId;

/// Indexed access to the truth (embedding) event stream.
///
/// The stream is iterated independently of the reconstructed stream,
/// so consumers look entries up by position rather than consuming them
/// in order. `get` takes `&mut self` so implementations may load entries
/// lazily from disk.
pub trait TruthSource {
    /// Number of entries in the stream.
    fn len(&self) -> usize;

    /// Whether the stream has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load the entry at `index`, or `None` if out of range.
    fn get(&mut self, index: usize) -> Option<&TruthEvent>;
}

/// Everything a centrality estimator may look at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CentralityInput {
    /// Run the event was recorded in.
    pub run: RunId,
    /// Standard reference multiplicity.
    pub ref_mult: u32,
    /// Global-track reference multiplicity.
    pub gref_mult: u32,
    /// Beam-monitor coincidence rate (Hz).
    pub beam_rate: f64,
    /// Vertex z position (cm).
    pub vertex_z: f64,
}

impl CentralityInput {
    /// Extract the estimator inputs from a reconstructed event.
    pub fn from_event(event: &ReconstructedEvent) -> Self {
        Self {
            run: event.identity.run,
            ref_mult: event.ref_mult,
            gref_mult: event.gref_mult,
            beam_rate: event.beam_rate,
            vertex_z: event.vertex.z,
        }
    }
}

/// Converts event-level observables into a discrete centrality class.
///
/// Implementations are pure: the same input always yields the same class.
pub trait CentralityProvider {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Number of centrality classes this provider can return.
    fn class_count(&self) -> u32;

    /// Classify an event into `0..class_count()`, or `None` if the event
    /// falls outside the calibration.
    fn classify(&self, input: &CentralityInput) -> Option<u32>;
}

/// Uniform read access to the quantities the track-cut cascade inspects.
///
/// Implemented by both matched pairs and data tracks so the same cascade
/// runs over either class.
pub trait TrackQuality {
    /// Transverse momentum (GeV/c).
    fn pt(&self) -> f64;
    /// Pseudorapidity.
    fn eta(&self) -> f64;
    /// Azimuth (radians).
    fn phi(&self) -> f64;
    /// 3-D distance of closest approach (cm).
    fn dca_global(&self) -> f64;
    /// Transverse distance of closest approach (cm).
    fn dca_transverse(&self) -> f64;
    /// Hits used in the fit.
    fn fit_points(&self) -> u32;
    /// Hits geometrically available.
    fn possible_points(&self) -> u32;

    /// `fit_points / possible_points`, or 0 when no points were possible.
    fn fit_fraction(&self) -> f64 {
        match self.possible_points() {
            0 => 0.0,
            p => f64::from(self.fit_points()) / f64::from(p),
        }
    }

    /// Inverse unfolding Jacobian for this track's DCA, if finite.
    fn jacobian_weight(&self) -> Option<f64> {
        inverse_jacobian(self.dca_global(), self.dca_transverse())
    }
}
