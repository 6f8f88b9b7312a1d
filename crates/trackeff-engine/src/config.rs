//! Assessor configuration: binning axes, grid layout, cuts, selection.

use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::fmt;

use trackeff_axis::{AxisDef, GridAxis};
use trackeff_core::{CentralityProvider, ConfigError, GeantId};
use trackeff_cuts::{EventCuts, TrackCutConfig};

// ── AxisSet ────────────────────────────────────────────────────────

/// Every binning axis the assessor uses.
///
/// Luminosity, centrality, vertex-z, and momentum form the grid; η and φ
/// are the axes of each grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisSet {
    /// Beam-monitor rate (Hz). Default: 3 bins over (0, 1e5].
    pub luminosity: AxisDef,
    /// Centrality class. Default: 9 bins over (-0.5, 8.5].
    pub centrality: AxisDef,
    /// Vertex z (cm). Default: 5 bins over (-30, 30].
    pub vertex_z: AxisDef,
    /// Transverse momentum (GeV/c). Default: 20 bins over (0, 5].
    pub momentum: AxisDef,
    /// Pseudorapidity. Default: 5 bins over (-1, 1].
    pub eta: AxisDef,
    /// Azimuth (radians). Default: 6 bins over (-π, π].
    pub phi: AxisDef,
}

impl Default for AxisSet {
    fn default() -> Self {
        Self {
            luminosity: AxisDef::new(3, 0.0, 1.0e5),
            centrality: AxisDef::new(9, -0.5, 8.5),
            vertex_z: AxisDef::new(5, -30.0, 30.0),
            momentum: AxisDef::new(20, 0.0, 5.0),
            eta: AxisDef::new(5, -1.0, 1.0),
            phi: AxisDef::new(6, -PI, PI),
        }
    }
}

impl AxisSet {
    /// Restore every axis to its default.
    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }

    /// Every axis with its name.
    pub fn named(&self) -> [GridAxis; 6] {
        [
            GridAxis { name: "lumi", axis: self.luminosity },
            GridAxis { name: "cent", axis: self.centrality },
            GridAxis { name: "vz", axis: self.vertex_z },
            GridAxis { name: "pt", axis: self.momentum },
            GridAxis { name: "eta", axis: self.eta },
            GridAxis { name: "phi", axis: self.phi },
        ]
    }

    /// All axes must be valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for a in self.named() {
            a.axis.validate(a.name)?;
        }
        Ok(())
    }
}

// ── GridAxes ───────────────────────────────────────────────────────

/// Which optional axes participate in the histogram grid.
///
/// Centrality and vertex-z always do. Coordinate order is luminosity,
/// centrality, vertex-z, momentum, skipping disabled axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridAxes {
    /// Bin the grid in beam-monitor rate. Default: true.
    pub luminosity: bool,
    /// Bin the grid in transverse momentum. Default: true.
    pub momentum: bool,
}

impl Default for GridAxes {
    fn default() -> Self {
        Self {
            luminosity: true,
            momentum: true,
        }
    }
}

impl GridAxes {
    /// Axes identifying an event: luminosity (optional), centrality, vertex-z.
    pub fn event_axes(&self, axes: &AxisSet) -> Vec<GridAxis> {
        let mut out = Vec::with_capacity(3);
        if self.luminosity {
            out.push(GridAxis { name: "lumi", axis: axes.luminosity });
        }
        out.push(GridAxis { name: "cent", axis: axes.centrality });
        out.push(GridAxis { name: "vz", axis: axes.vertex_z });
        out
    }

    /// Axes of the track grid: the event axes plus momentum (optional).
    pub fn track_axes(&self, axes: &AxisSet) -> Vec<GridAxis> {
        let mut out = self.event_axes(axes);
        if self.momentum {
            out.push(GridAxis { name: "pt", axis: axes.momentum });
        }
        out
    }
}

// ── AssessorConfig ─────────────────────────────────────────────────

/// Complete configuration of an efficiency assessor.
///
/// `validate()` checks every structural invariant; the assessor calls it
/// when it is initialized.
pub struct AssessorConfig {
    /// Binning axes.
    pub axes: AxisSet,
    /// Optional grid axes.
    pub grid: GridAxes,
    /// Track cascade thresholds.
    pub track_cuts: TrackCutConfig,
    /// Event-level cuts.
    pub event_cuts: EventCuts,
    /// Accepted particle types for truth particles and matched pairs.
    /// Empty accepts all.
    pub geant_ids: BTreeSet<GeantId>,
    /// Data tracks with `|pid_sigma| < pid_window` enter the PID families.
    /// Default: 2.0.
    pub pid_window: f64,
    /// Fill grid cells with the inverse-Jacobian weight instead of 1.
    /// Default: false.
    pub weight_cells_by_jacobian: bool,
    /// Centrality estimator. Required.
    pub centrality: Option<Box<dyn CentralityProvider>>,
}

impl Default for AssessorConfig {
    fn default() -> Self {
        Self {
            axes: AxisSet::default(),
            grid: GridAxes::default(),
            track_cuts: TrackCutConfig::default(),
            event_cuts: EventCuts::new(),
            geant_ids: BTreeSet::new(),
            pid_window: 2.0,
            weight_cells_by_jacobian: false,
            centrality: None,
        }
    }
}

impl AssessorConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Every axis must be valid.
        self.axes.validate()?;
        // 2. A centrality provider must be configured.
        let Some(centrality) = &self.centrality else {
            return Err(ConfigError::NoCentralityProvider);
        };
        if centrality.class_count() == 0 {
            return Err(ConfigError::InvalidCentrality {
                reason: format!("provider '{}' has no classes", centrality.name()),
            });
        }
        // 3. Cut thresholds must be usable.
        self.track_cuts.validate()?;
        self.event_cuts.validate()?;
        // 4. PID window must be finite and positive.
        if !self.pid_window.is_finite() || self.pid_window <= 0.0 {
            return Err(ConfigError::InvalidCut {
                reason: format!("pid_window must be finite and positive, got {}", self.pid_window),
            });
        }
        Ok(())
    }

    /// Whether a particle type passes the GEANT-id filter.
    pub fn accepts_geant_id(&self, id: GeantId) -> bool {
        self.geant_ids.is_empty() || self.geant_ids.contains(&id)
    }
}

impl fmt::Debug for AssessorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessorConfig")
            .field("axes", &self.axes)
            .field("grid", &self.grid)
            .field("track_cuts", &self.track_cuts)
            .field("event_cuts", &self.event_cuts)
            .field("geant_ids", &self.geant_ids)
            .field("pid_window", &self.pid_window)
            .field("weight_cells_by_jacobian", &self.weight_cells_by_jacobian)
            .field("centrality", &self.centrality.as_ref().map(|c| c.name()))
            .finish()
    }
}
